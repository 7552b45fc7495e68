use url::Url;

/// Convenience wrapper for generating the public URLs of new resources.
#[derive(Clone, Debug)]
pub struct Urls {
    /// The public root of the service. Any path is kept as a prefix.
    base: Url,
}

impl Urls {
    /// Creates a new instance. Panics if `base` isn't an absolute URL that
    /// can have a path.
    pub fn new(base: impl AsRef<str>) -> Self {
        let base =
            Url::parse(base.as_ref()).unwrap_or_else(|_| panic!("parse {} as URL", base.as_ref()));

        if base.cannot_be_a_base() {
            panic!("{} cannot be used as a base URL", base);
        }

        Urls { base }
    }

    pub fn dj(&self, id: &str) -> Url {
        self.resource(&["api", "djs", id])
    }

    pub fn performance(&self, id: &str) -> Url {
        self.resource(&["api", "performances", id])
    }

    pub fn review(&self, id: &str) -> Url {
        self.resource(&["api", "reviews", id])
    }

    fn resource(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();

        url.path_segments_mut()
            .expect("get path segments of base URL")
            .pop_if_empty()
            .extend(segments);

        url
    }
}
