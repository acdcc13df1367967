use ndarray::Array3;

/// Image whose red channel encodes (row, col) and whose label carries the
/// same code, so any geometric mismatch between the two is detectable.
///
/// Values are kept small enough to be exact in `f32`.
pub fn coded_pair(height: usize, width: usize) -> (Array3<f32>, Array3<i32>) {
    let image = Array3::from_shape_fn((height, width, 3), |(y, x, c)| match c {
        0 => (y * 1000 + x) as f32,
        _ => 0.0,
    });
    let label = Array3::from_shape_fn((height, width, 1), |(y, x, _)| (y * 1000 + x) as i32);
    (image, label)
}

/// Constant-valued image and label of the given size.
pub fn constant_pair(height: usize, width: usize, pixel: u8, class: u8) -> (Array3<u8>, Array3<u8>) {
    (
        Array3::from_elem((height, width, 3), pixel),
        Array3::from_elem((height, width, 1), class),
    )
}

/// Installs a test-writer fmt subscriber once; honours `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
