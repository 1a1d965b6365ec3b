use anyhow::anyhow;
use std::error::Error as StdError;
use std::io::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TransportFailure {
    TimedOut,
    ConnectionRefused,
    Unreachable,
    Other,
}

fn source_chain<'a>(
    err: &'a (dyn StdError + 'static),
) -> impl Iterator<Item = &'a (dyn StdError + 'static)> {
    std::iter::successors(Some(err), |&current: &&'a (dyn StdError + 'static)| current.source())
}

/// True if any error in the chain is an I/O error of `kind` or mentions
/// `needle` (lowercase) in its message.
fn chain_mentions(err: &(dyn StdError + 'static), kind: ErrorKind, needle: &str) -> bool {
    source_chain(err).any(|source| {
        source
            .downcast_ref::<std::io::Error>()
            .is_some_and(|io_err| io_err.kind() == kind)
            || source.to_string().to_ascii_lowercase().contains(needle)
    })
}

fn classify(err: &reqwest::Error) -> TransportFailure {
    if err.is_timeout() || chain_mentions(err, ErrorKind::TimedOut, "timed out") {
        TransportFailure::TimedOut
    } else if !err.is_connect() {
        TransportFailure::Other
    } else if chain_mentions(err, ErrorKind::ConnectionRefused, "connection refused") {
        TransportFailure::ConnectionRefused
    } else {
        TransportFailure::Unreachable
    }
}

pub(crate) fn model_api_request_error(err: reqwest::Error, api_url: &str) -> anyhow::Error {
    match classify(&err) {
        TransportFailure::TimedOut => anyhow!(
            "Model request timed out while calling '{api_url}'. \
             Check network connectivity and MODEL_BASE_URL."
        ),
        TransportFailure::ConnectionRefused => anyhow!(
            "Connection refused by model API at '{api_url}'. \
             Ensure the endpoint is reachable and MODEL_BASE_URL is correct."
        ),
        TransportFailure::Unreachable => anyhow!(
            "Failed to connect to model API at '{api_url}'. \
             Check MODEL_BASE_URL and network connectivity."
        ),
        TransportFailure::Other => {
            anyhow::Error::new(err).context(format!("Failed to call model API at '{api_url}'"))
        }
    }
}
