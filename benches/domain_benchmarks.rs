use criterion::{Criterion, criterion_group, criterion_main};
use restaurant_directory::domain::{
    FieldFailure, NewUser, NewUserBatch, RequestContext, shape, validate_input,
};
use restaurant_directory::infra::ErrorTranslator;
use std::hint::black_box;

fn bench_validation(c: &mut Criterion) {
    let valid = NewUser::new("Ada Lovelace", "ada@example.com");
    let invalid = NewUser::new("A", "not-an-email");
    let batch = NewUserBatch {
        users: (0..50)
            .map(|i| NewUser::new(format!("User {i}"), format!("user{i}@example.com")))
            .collect(),
    };

    c.bench_function("validate_new_user", |b| {
        b.iter(|| {
            let _ = black_box(validate_input(black_box(&valid)));
        })
    });

    c.bench_function("validate_new_user_failing", |b| {
        b.iter(|| {
            let _ = black_box(validate_input(black_box(&invalid)));
        })
    });

    c.bench_function("validate_user_batch_50", |b| {
        b.iter(|| {
            let _ = black_box(validate_input(black_box(&batch)));
        })
    });

    let failures = vec![
        FieldFailure::new("email", "email"),
        FieldFailure::new("name", "min").with_param("2"),
        FieldFailure::new("restaurant_name", "max").with_param("255"),
    ];
    c.bench_function("shape_three_failures", |b| {
        b.iter(|| black_box(shape(black_box(&failures))))
    });
}

fn bench_translation(c: &mut Criterion) {
    let translator = ErrorTranslator::default();
    let ctx = RequestContext::new();
    let not_found = sqlx::Error::RowNotFound;
    let timed_out = sqlx::Error::PoolTimedOut;

    c.bench_function("translate_row_not_found", |b| {
        b.iter(|| black_box(translator.translate(&ctx, black_box(&not_found))))
    });

    c.bench_function("translate_pool_timeout", |b| {
        b.iter(|| black_box(translator.translate(&ctx, black_box(&timed_out))))
    });
}

criterion_group!(benches, bench_validation, bench_translation);
criterion_main!(benches);
