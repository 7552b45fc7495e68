use std::time::Duration;

use serde::de::DeserializeOwned;
use warp::hyper::body::Bytes;
use warp::reject;
use warp::reply::Reply;

use crate::errors::FestivalError;

pub use self::catalog::*;
pub use self::reviews::*;

const SERVER_TIMING_HEADER: &str = "server-timing";
type RouteResult = Result<Box<dyn Reply>, reject::Rejection>;

macro_rules! timed {
    ($($expression:stmt);+) => {
        let start = std::time::Instant::now();

        let result = { $($expression)+ };

        Ok(Box::new(warp::reply::with_header(
            result,
            SERVER_TIMING_HEADER,
            format_server_timing(start.elapsed()),
        )) as Box<dyn Reply>)
    };
}

mod catalog;
mod reviews;

/// Parses a JSON request body. Anything serde can't read becomes a
/// `MalformedBody` error.
fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, FestivalError> {
    serde_json::from_slice(body).map_err(|e| FestivalError::MalformedBody(e.to_string()))
}

/// Percent-decodes a path segment, falling back to the raw text when it
/// isn't valid UTF-8 once decoded.
fn decode(raw: &str) -> String {
    urlencoding::decode(raw)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| raw.to_owned())
}

fn format_server_timing(seconds: Duration) -> String {
    format!("handler;dur={}", seconds.as_secs_f64() * 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dj::DjPayload;

    #[test]
    fn path_segments_are_decoded() {
        assert_eq!(decode("Hip%20Hop"), "Hip Hop");
        assert_eq!(decode("DJ%2FShadow"), "DJ/Shadow");
        assert_eq!(decode("plain"), "plain");
        assert_eq!(decode("%FF"), "%FF");
    }

    #[test]
    fn unparseable_bodies_are_malformed() {
        let result: Result<DjPayload, _> = parse_body(&Bytes::from_static(b"{\"name\": "));

        assert!(matches!(result, Err(FestivalError::MalformedBody(_))));
    }

    #[test]
    fn server_timing_is_in_milliseconds() {
        assert_eq!(
            format_server_timing(Duration::from_millis(500)),
            "handler;dur=500"
        );
    }
}
