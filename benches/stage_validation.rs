use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use netabase_lifecycle::logging::Logger;
use netabase_lifecycle::migration::{
    MigrationDirection, MigrationPlan, MigrationStage, StageValidator, ValidationStrictness,
};
use netabase_lifecycle::schema::cloud::CloudCompatibility;
use netabase_lifecycle::schema::{AttributeSchema, EntitySchema, SchemaVersion, VersionedSchema};

fn chain(size: u32) -> MigrationPlan {
    let versions: Vec<_> = (1..=size).map(|major| SchemaVersion::new(major, 0, 0)).collect();
    let stages = versions
        .windows(2)
        .map(|pair| MigrationStage::lightweight(pair[0], pair[1]))
        .collect();
    let schemas = versions
        .iter()
        .map(|version| {
            VersionedSchema::new("Bench", *version).with_entity(
                EntitySchema::new("Article")
                    .with_attribute(AttributeSchema::new("title", "String").with_default("\"\""))
                    .with_attribute(AttributeSchema::new("body", "String").optional()),
            )
        })
        .collect();
    MigrationPlan::new(schemas, stages, MigrationDirection::Forward)
}

fn bench_stage_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("stage_chain");
    let validator = StageValidator::new(&Logger::new("bench", "validation"));

    for size in [10u32, 100, 1000].iter() {
        let plan = chain(*size);
        group.bench_with_input(BenchmarkId::new("contiguous", size), &plan, |b, plan| {
            b.iter(|| black_box(validator.check(plan, None).is_ok()));
        });

        let catalog = plan.clone().with_strictness(ValidationStrictness::CatalogOrder);
        group.bench_with_input(BenchmarkId::new("catalog_order", size), &catalog, |b, plan| {
            b.iter(|| black_box(validator.check(plan, None).is_ok()));
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");

    for size in [10u32, 100, 1000].iter() {
        let plan = chain(*size);
        let (first, last) = (SchemaVersion::new(1, 0, 0), SchemaVersion::new(*size, 0, 0));
        group.bench_with_input(BenchmarkId::new("full_chain", size), &plan, |b, plan| {
            b.iter(|| black_box(plan.resolve(first, last).map(|steps| steps.len())));
        });
    }

    group.finish();
}

fn bench_cloud_check(c: &mut Criterion) {
    let plan = chain(100);
    c.bench_function("cloud_violations_100_schemas", |b| {
        b.iter(|| {
            black_box(
                plan.schemas
                    .iter()
                    .map(|schema| CloudCompatibility::violations(schema).len())
                    .sum::<usize>(),
            )
        });
    });
}

criterion_group!(benches, bench_stage_chain, bench_resolve, bench_cloud_check);
criterion_main!(benches);
