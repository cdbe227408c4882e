use cart_store::{Cart, CartItem, InMemoryCartStore, InMemoryHistoryStore};
use common::{ObjectId, StudentId, TeacherId};
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{
    AddToCart, CartService, ClearScope, InMemoryProductCatalog, ProductSnapshot, QuantityChange,
    mutation,
};

fn teacher() -> TeacherId {
    TeacherId::parse("teacher-1").unwrap()
}

fn student() -> StudentId {
    StudentId::parse("student-1").unwrap()
}

fn bench_pure_mutations(c: &mut Criterion) {
    let products: Vec<ObjectId> = (0..20).map(|_| ObjectId::new()).collect();

    c.bench_function("domain/pure_add_20_then_archive", |b| {
        b.iter(|| {
            let mut cart = Cart::new(teacher(), student());
            for id in &products {
                mutation::add_item(&mut cart, CartItem::new(*id, "Item", 1.25, 2, "")).unwrap();
            }
            mutation::archive_items(&mut cart);
        });
    });
}

fn bench_add_to_cart(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let catalog = InMemoryProductCatalog::new();
    let product = ObjectId::new();
    catalog.insert(product, ProductSnapshot::new("Pencil", 0.5, ""));
    let service = CartService::new(
        InMemoryCartStore::new(),
        InMemoryHistoryStore::new(),
        catalog,
    );

    c.bench_function("domain/add_to_cart", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .add_to_cart(AddToCart {
                        teacher_id: teacher(),
                        student_id: student(),
                        product_id: product.to_hex(),
                        quantity: 1,
                    })
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_change_quantity(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let service = CartService::new(
        InMemoryCartStore::new(),
        InMemoryHistoryStore::new(),
        InMemoryProductCatalog::new(),
    );
    let product = ObjectId::new();
    rt.block_on(async {
        service
            .add_item(
                &teacher(),
                &student(),
                CartItem::new(product, "Eraser", 0.75, 1, ""),
            )
            .await
            .unwrap();
    });

    c.bench_function("domain/increase_then_decrease", |b| {
        b.iter(|| {
            rt.block_on(async {
                service
                    .change_quantity(&teacher(), &student(), product, QuantityChange::Increase)
                    .await
                    .unwrap();
                service
                    .change_quantity(&teacher(), &student(), product, QuantityChange::Decrease)
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_clear_teacher(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("domain/clear_teacher_10_carts", |b| {
        b.iter(|| {
            rt.block_on(async {
                let service = CartService::new(
                    InMemoryCartStore::new(),
                    InMemoryHistoryStore::new(),
                    InMemoryProductCatalog::new(),
                );
                for s in 0..10 {
                    let student_id = StudentId::parse(format!("student-{s}")).unwrap();
                    service
                        .add_item(
                            &teacher(),
                            &student_id,
                            CartItem::new(ObjectId::new(), "Ruler", 1.0, 3, ""),
                        )
                        .await
                        .unwrap();
                }
                service.clear(ClearScope::Teacher(teacher())).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_pure_mutations,
    bench_add_to_cart,
    bench_change_quantity,
    bench_clear_teacher,
);
criterion_main!(benches);
