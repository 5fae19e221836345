//! Benchmarks for the change diff
//!
//! Run with: cargo bench diff

use exrange::diff::{diff, diff_with_caret};

#[global_allocator]
static ALLOC: divan::AllocProfiler = divan::AllocProfiler::system();

fn main() {
    divan::main();
}

fn sample(line_count: usize) -> String {
    "The quick brown fox jumps over the lazy dog.\n".repeat(line_count)
}

// ============================================================================
// Single edits in large buffers
// ============================================================================

#[divan::bench(args = [1_000, 10_000, 100_000])]
fn diff_edit_in_middle(bencher: divan::Bencher, line_count: usize) {
    let old = sample(line_count);
    let mid = old.len() / 2;
    let mut new = old.clone();
    new.insert_str(mid, "inserted");
    bencher.bench(|| diff(divan::black_box(&old), divan::black_box(&new)));
}

#[divan::bench(args = [1_000, 10_000, 100_000])]
fn diff_unchanged(bencher: divan::Bencher, line_count: usize) {
    let old = sample(line_count);
    let new = old.clone();
    bencher.bench(|| diff(divan::black_box(&old), divan::black_box(&new)));
}

#[divan::bench(args = [1_000, 10_000])]
fn diff_repeated_char_with_caret(bencher: divan::Bencher, len: usize) {
    let old = "a".repeat(len);
    let new = "a".repeat(len + 1);
    bencher.bench(|| diff_with_caret(divan::black_box(&old), divan::black_box(&new), len / 2 + 1));
}

// ============================================================================
// Whole-buffer rewrites
// ============================================================================

#[divan::bench(args = [1_000, 10_000])]
fn diff_total_rewrite(bencher: divan::Bencher, line_count: usize) {
    let old = sample(line_count);
    let new = old.to_uppercase();
    bencher.bench(|| diff(divan::black_box(&old), divan::black_box(&new)));
}
