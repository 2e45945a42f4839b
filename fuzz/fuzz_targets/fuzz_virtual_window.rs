#![no_main]

use arbitrary::Arbitrary;
use gridflow_grid::{Record, Row, VirtualRenderer, WindowMetrics};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Step {
    Scroll(f64),
    Resize(f64),
    SetRows(u16),
    Reset,
}

#[derive(Arbitrary, Debug)]
struct Input {
    row_height: f64,
    buffer: u8,
    steps: Vec<Step>,
}

fn rows(count: u16) -> Vec<Row> {
    (0..count)
        .map(|i| Record::new().with("id", f64::from(i)).into_row())
        .collect()
}

fuzz_target!(|input: Input| {
    let metrics = WindowMetrics::new(input.row_height, 0.0).with_buffer(usize::from(input.buffer));
    let mut renderer = VirtualRenderer::new(metrics);

    for step in input.steps.into_iter().take(128) {
        let slice = match step {
            Step::Scroll(top) => renderer.scroll(top),
            Step::Resize(height) => renderer.resize(height),
            Step::SetRows(count) => renderer.set_rows(rows(count % 4096)),
            Step::Reset => {
                renderer.reset();
                None
            }
        };

        let total = renderer.rows().len();
        let range = renderer.range();
        assert!(range.start <= range.end && range.end <= total);

        if let Some(slice) = slice {
            assert!(slice.start_index <= slice.end_index);
            assert!(slice.end_index <= total);
            assert_eq!(slice.rows.len(), slice.end_index - slice.start_index);
            for (offset, indexed) in slice.rows.iter().enumerate() {
                assert_eq!(indexed.index, slice.start_index + offset);
            }
        }
    }
});
