//! Benchmarks for content model compilation and validation

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use xsd_content_model::namespaces::QName;
use xsd_content_model::validators::{
    CmBuilder, ContentModel, GroupParticle, ModelType, Occurs, XsdGroup,
};
use xsd_content_model::{Limits, LogReporter};

fn builder() -> CmBuilder {
    CmBuilder::new(&Limits::default(), Arc::new(LogReporter))
}

/// (head, (para | list | table){1,50}, tail?)
fn document_model() -> GroupParticle {
    let mut body = XsdGroup::new(ModelType::Choice).with_occurs(Occurs::new(1, Some(50)));
    for name in ["para", "list", "table"] {
        body.add_element(QName::local(name), Occurs::once());
    }
    let mut root = XsdGroup::new(ModelType::Sequence);
    root.add_element(QName::local("head"), Occurs::once());
    root.add_group(body);
    root.add_element(QName::local("tail"), Occurs::optional());
    root.into()
}

/// (item{0,1000}, footer)
fn counted_model() -> GroupParticle {
    let mut root = XsdGroup::new(ModelType::Sequence);
    root.add_element(QName::local("item"), Occurs::new(0, Some(1000)));
    root.add_element(QName::local("footer"), Occurs::once());
    root.into()
}

fn bench_compile_expanded(c: &mut Criterion) {
    let particle = document_model();
    let mut builder = builder();

    c.bench_function("compile_expanded_range", |b| {
        b.iter(|| builder.build(black_box(&particle), false).unwrap())
    });
}

fn bench_compile_for_upa(c: &mut Criterion) {
    let particle = document_model();
    let mut builder = builder();

    c.bench_function("compile_for_upa", |b| {
        b.iter(|| builder.build(black_box(&particle), true).unwrap())
    });
}

fn bench_compile_repeating_leaf(c: &mut Criterion) {
    let particle = counted_model();
    let mut builder = builder();

    c.bench_function("compile_repeating_leaf", |b| {
        b.iter(|| builder.build(black_box(&particle), false).unwrap())
    });
}

fn bench_validate_expanded(c: &mut Criterion) {
    let model = builder().build(&document_model(), false).unwrap();
    let mut children = vec![QName::local("head")];
    for i in 0..48 {
        children.push(QName::local(["para", "list", "table"][i % 3]));
    }
    children.push(QName::local("tail"));

    c.bench_function("validate_50_children", |b| {
        b.iter(|| model.validate(black_box(&children)))
    });
}

fn bench_validate_counting(c: &mut Criterion) {
    let model = builder().build(&counted_model(), false).unwrap();
    let mut children = vec![QName::local("item"); 999];
    children.push(QName::local("footer"));

    c.bench_function("validate_1000_counted", |b| {
        b.iter(|| model.validate(black_box(&children)))
    });
}

fn bench_ambiguities(c: &mut Criterion) {
    let model = builder().build(&document_model(), true).unwrap();

    c.bench_function("upa_conflicts", |b| b.iter(|| black_box(model.ambiguities())));
}

criterion_group!(
    benches,
    bench_compile_expanded,
    bench_compile_for_upa,
    bench_compile_repeating_leaf,
    bench_validate_expanded,
    bench_validate_counting,
    bench_ambiguities,
);
criterion_main!(benches);
