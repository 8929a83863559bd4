use bencher::{benchmark_group, benchmark_main, Bencher};
use rxkit::prelude::*;

fn repeat_on_trampoline(b: &mut Bencher) {
  let source = observable::from_iter([1, 2, 3]).repeat(10_000);
  let scheduler = SharedScheduler::trampoline();
  b.iter(|| source.to_vec(&scheduler).map(|v| v.len()));
}

fn map_filter_chain(b: &mut Bencher) {
  let source = observable::range(0, 10_000)
    .map(|v| v * 3)
    .filter(|v| v % 2 == 0);
  let scheduler = SharedScheduler::trampoline();
  b.iter(|| source.to_vec(&scheduler).map(|v| v.len()));
}

benchmark_group!(benches, repeat_on_trampoline, map_filter_chain);
benchmark_main!(benches);
