#![deny(missing_docs)]
//! Utilities for testing pictor modules.

pub mod request;
pub mod sink;

/// Enable tracing with the RUST_LOG environment variable.
///
/// This is intended to be used in tests, so it defaults to DEBUG level.
pub fn enable_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(tracing::Level::DEBUG.into())
                .from_env_lossy(),
        )
        .try_init();
}

/// Repeatedly run a block of code until it breaks out of the implicit
/// loop, panicking when the timeout elapses first. The default timeout
/// is 1000 ms.
///
/// ```ignore
/// iter_check!(500, {
///     if sink.completion_count() == 2 {
///         break;
///     }
/// });
/// ```
#[macro_export]
macro_rules! iter_check {
    ($timeout_ms:expr, $body:block) => {{
        let timeout_at = std::time::Instant::now()
            + std::time::Duration::from_millis($timeout_ms);
        loop {
            $body

            if std::time::Instant::now() > timeout_at {
                panic!("iter_check timed out after {} ms", $timeout_ms);
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    }};
    ($body:block) => {{
        $crate::iter_check!(1000, $body)
    }};
}

/// Encode a solid-color RGBA image of the given dimensions as PNG bytes.
///
/// Useful as a payload that the default decoder genuinely decodes.
pub fn png_bytes(width: u32, height: u32) -> bytes::Bytes {
    let img = image::DynamicImage::ImageRgba8(image::RgbaImage::from_pixel(
        width,
        height,
        image::Rgba([10, 20, 30, 255]),
    ));
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("failed to encode test png");
    bytes::Bytes::from(out.into_inner())
}
