use cart_store::{
    CartHistoryEntry, CartItem, CartStore, CartStoreExt, HistoryEventType, HistoryStore,
    HistoryStoreExt, InMemoryCartStore, InMemoryHistoryStore, ObjectId, StudentId, TeacherId,
};
use criterion::{Criterion, criterion_group, criterion_main};

fn teacher(id: &str) -> TeacherId {
    TeacherId::parse(id).unwrap()
}

fn student(id: &str) -> StudentId {
    StudentId::parse(id).unwrap()
}

fn bench_get_or_create(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("cart_store/get_or_create_new", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryCartStore::new();
                store.get_or_create(&teacher("t"), &student("s")).await.unwrap();
            });
        });
    });
}

fn bench_replace(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryCartStore::new();

    c.bench_function("cart_store/replace_with_version_check", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut cart = store.get_or_create(&teacher("t"), &student("s")).await.unwrap();
                cart.items = vec![CartItem::new(ObjectId::new(), "Notebook", 4.5, 3, "")];
                cart.recompute_total();
                store.replace(&cart).await.unwrap();
            });
        });
    });
}

fn bench_list_grouped(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryCartStore::new();

    // 10 teachers x 20 students
    rt.block_on(async {
        for t in 0..10 {
            for s in 0..20 {
                store
                    .get_or_create(&teacher(&format!("t{t}")), &student(&format!("s{s}")))
                    .await
                    .unwrap();
            }
        }
    });

    c.bench_function("cart_store/list_all_grouped_200", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.list_all_grouped_by_teacher().await.unwrap();
            });
        });
    });
}

fn bench_history_by_teacher(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let history = InMemoryHistoryStore::new();

    rt.block_on(async {
        let entries: Vec<_> = (0..500)
            .map(|i| {
                CartHistoryEntry::new(
                    teacher(if i % 2 == 0 { "t1" } else { "t2" }),
                    student(&format!("s{}", i % 25)),
                    ObjectId::new(),
                    HistoryEventType::Add,
                    1,
                )
            })
            .collect();
        history.append(entries).await.unwrap();
    });

    c.bench_function("cart_store/history_by_teacher_500", |b| {
        b.iter(|| {
            rt.block_on(async {
                history.query_by_teacher(&teacher("t1")).await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_get_or_create,
    bench_replace,
    bench_list_grouped,
    bench_history_by_teacher,
);
criterion_main!(benches);
