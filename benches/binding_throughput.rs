//! Benchmark suite for record binding throughput
//!
//! This benchmark measures:
//! - Binding a parsed record schema to a property set
//! - Extracting records from runtime objects, directly and through converters
//! - Populating runtime objects from records, including array fields
//!
//! # Configuration
//!
//! Benchmark behavior can be configured via environment variables:
//!
//! - `BENCH_SAMPLE_SIZE`: Number of samples to collect (default: 100)
//! - `BENCH_MEASUREMENT_TIME`: Measurement time in seconds (default: 5)
//!
//! # Examples
//!
//! ```bash
//! BENCH_SAMPLE_SIZE=50 BENCH_MEASUREMENT_TIME=3 cargo bench
//! ```

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;
use std::time::Duration;

use avro_bind::value;
use avro_bind::{
    parse_schema, BindingConfig, ConverterRegistry, Property, PropertySet, RecordBinding,
    RuntimeType, SequenceKind, Value,
};

const SCHEMA: &str = r#"{
    "type": "record",
    "name": "Reading",
    "namespace": "bench",
    "fields": [
        {"name": "sensor", "type": "string"},
        {"name": "seq", "type": "long"},
        {"name": "level", "type": "string", "default": "LOW"},
        {"name": "samples", "type": {"type": "array", "items": "double"}}
    ]
}"#;

#[derive(Debug, Clone, Copy, Default)]
enum Level {
    #[default]
    Low,
    High,
}

#[derive(Debug, Clone, Default)]
struct Reading {
    sensor: String,
    seq: i64,
    level: Level,
    samples: Vec<f64>,
}

fn properties() -> PropertySet<Reading> {
    PropertySet::new("Reading")
        .with(
            Property::new("sensor", "Reading", RuntimeType::Text, |r: &Reading| {
                r.sensor.clone().into()
            })
            .with_setter(|r, v| {
                r.sensor = v.try_into()?;
                Ok(())
            }),
        )
        .with(
            Property::new("seq", "Reading", RuntimeType::I64, |r: &Reading| r.seq.into())
                .with_setter(|r, v| {
                    r.seq = v.try_into()?;
                    Ok(())
                }),
        )
        .with(
            Property::new(
                "level",
                "Reading",
                RuntimeType::enumeration("Level"),
                |r: &Reading| match r.level {
                    Level::Low => Value::Enum(0, "LOW".to_string()),
                    Level::High => Value::Enum(1, "HIGH".to_string()),
                },
            )
            .with_setter(|r, v| {
                r.level = match v {
                    Value::Enum(_, symbol) if symbol == "HIGH" => Level::High,
                    _ => Level::Low,
                };
                Ok(())
            }),
        )
        .with(
            Property::new(
                "samples",
                "Reading",
                RuntimeType::list(RuntimeType::F64),
                |r: &Reading| {
                    r.samples
                        .iter()
                        .copied()
                        .map(Value::from)
                        .collect::<Vec<_>>()
                        .into()
                },
            )
            .with_setter(|r, v| {
                r.samples = value::list(v)?;
                Ok(())
            }),
        )
}

fn registry() -> ConverterRegistry {
    ConverterRegistry::builder_with_defaults()
        .register_enum("Level", ["LOW", "HIGH"])
        .unwrap()
        .build()
}

fn reading(samples: usize) -> Reading {
    Reading {
        sensor: "sensor-7".to_string(),
        seq: 42,
        level: Level::High,
        samples: (0..samples).map(|i| i as f64 * 0.5).collect(),
    }
}

/// Configure Criterion based on environment variables
fn configure_criterion() -> Criterion {
    let mut criterion = Criterion::default();

    if let Ok(sample_size) = std::env::var("BENCH_SAMPLE_SIZE") {
        if let Ok(size) = sample_size.parse::<usize>() {
            criterion = criterion.sample_size(size);
        } else {
            eprintln!("Warning: Invalid BENCH_SAMPLE_SIZE value: {}", sample_size);
        }
    }

    if let Ok(measurement_time) = std::env::var("BENCH_MEASUREMENT_TIME") {
        if let Ok(secs) = measurement_time.parse::<u64>() {
            criterion = criterion.measurement_time(Duration::from_secs(secs));
        } else {
            eprintln!(
                "Warning: Invalid BENCH_MEASUREMENT_TIME value: {}",
                measurement_time
            );
        }
    }

    criterion
}

fn bench_bind(c: &mut Criterion) {
    let schema = parse_schema(SCHEMA).unwrap();
    let properties = properties();
    let registry = registry();
    let config = BindingConfig::default();

    c.bench_function("bind_record", |b| {
        b.iter(|| {
            RecordBinding::bind_schema(
                black_box(&schema),
                &properties,
                &registry,
                &config,
            )
            .unwrap()
        });
    });
}

fn bench_extract_populate(c: &mut Criterion) {
    let schema = parse_schema(SCHEMA).unwrap();
    let mut group = c.benchmark_group("record_round_trip");

    for kind in [SequenceKind::List, SequenceKind::Preallocated(256)] {
        let config = BindingConfig::new().with_sequence_kind(kind);
        let binding = RecordBinding::bind_schema(
            &schema,
            &properties(),
            &registry(),
            &config,
        )
        .unwrap();

        for samples in [0usize, 16, 256] {
            let source = reading(samples);
            let record = binding.extract(&source).unwrap();
            group.throughput(Throughput::Elements(1));

            group.bench_with_input(
                BenchmarkId::new(format!("extract/{:?}", kind), samples),
                &source,
                |b, source| b.iter(|| binding.extract(black_box(source)).unwrap()),
            );

            group.bench_with_input(
                BenchmarkId::new(format!("populate/{:?}", kind), samples),
                &record,
                |b, record| {
                    b.iter(|| {
                        let mut target = Reading::default();
                        binding.populate(&mut target, black_box(record)).unwrap();
                        target
                    })
                },
            );
        }
    }

    group.finish();
}

criterion_group! {
    name = benches;
    config = configure_criterion();
    targets = bench_bind, bench_extract_populate
}

criterion_main!(benches);
