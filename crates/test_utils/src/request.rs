//! Test request helpers.

use pictor_api::ImageRequest;
use url::Url;

/// A stable test address under the `images.test` host.
pub fn test_address(name: &str) -> Url {
    Url::parse(&format!("https://images.test/{name}"))
        .expect("failed to parse test address")
}

/// A default request for a [test_address].
pub fn test_request(name: &str) -> ImageRequest {
    ImageRequest::new(test_address(name))
}
