use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pagekit_editor::{props_from_value, Block, BlockId, EditSession, EditorConfig, IdGenerator, Theme};
use serde_json::json;

fn large_session(blocks: usize) -> EditSession {
    let mut session = EditSession::new(EditorConfig::default()).with_id_generator(IdGenerator::new("bench"));
    for i in 0..blocks {
        let props = props_from_value(json!({
            "title": format!("Section {}", i),
            "description": "Lorem ipsum dolor sit amet, consectetur adipiscing elit",
            "features": [{"title": "Fast"}, {"title": "Fresh"}, {"title": "Local"}],
        }));
        session.insert_at(i, Block::new(format!("b{}", i), "Features", "FeaturesGrid").with_props(props));
    }
    session
}

fn update_props_on_large_page(c: &mut Criterion) {
    let mut session = large_session(200);
    let target = BlockId::from("b100");
    let mut n = 0u64;

    c.bench_function("update_props_200_blocks", |b| {
        b.iter(|| {
            n += 1;
            session.update_props(black_box(&target), props_from_value(json!({"title": n})))
        })
    });
}

fn undo_redo_on_large_page(c: &mut Criterion) {
    let mut session = large_session(200);
    for i in 0..50 {
        session.update_element_content(&BlockId::from("b10"), "heading", &format!("v{}", i));
    }

    c.bench_function("undo_redo_200_blocks", |b| {
        b.iter(|| {
            session.undo();
            session.redo();
        })
    });
}

fn theme_on_large_page(c: &mut Criterion) {
    let mut session = large_session(200);
    let themes = [Theme::new("#000", "#fff"), Theme::new("#fff", "#000")];
    let mut i = 0;

    c.bench_function("apply_theme_200_blocks", |b| {
        b.iter(|| {
            i += 1;
            session.apply_global_theme(black_box(themes[i % 2].clone()))
        })
    });
}

criterion_group!(benches, update_props_on_large_page, undo_redo_on_large_page, theme_on_large_page);
criterion_main!(benches);
