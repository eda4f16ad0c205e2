use crate::engine::error::EngineError;
use crate::engine::request::Operation;
use crate::engine::store::validate_name;

/// The handler a path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Keys,
    KeyList,
    Export,
    Sign,
    Verify,
    Decrypt,
    ShowSessionKey,
}

struct Route {
    prefix: &'static str,
    endpoint: Endpoint,
    operations: &'static [Operation],
    /// Accepts one more path segment after the name.
    trailing_segment: bool,
}

const WRITE: &[Operation] = &[Operation::Update, Operation::Create];

const ROUTES: &[Route] = &[
    Route {
        prefix: "keys/",
        endpoint: Endpoint::Keys,
        operations: &[
            Operation::Create,
            Operation::Update,
            Operation::Read,
            Operation::Delete,
        ],
        trailing_segment: false,
    },
    Route {
        prefix: "export/",
        endpoint: Endpoint::Export,
        operations: &[Operation::Read],
        trailing_segment: false,
    },
    Route {
        prefix: "sign/",
        endpoint: Endpoint::Sign,
        operations: WRITE,
        trailing_segment: true,
    },
    Route {
        prefix: "verify/",
        endpoint: Endpoint::Verify,
        operations: WRITE,
        trailing_segment: false,
    },
    Route {
        prefix: "decrypt/",
        endpoint: Endpoint::Decrypt,
        operations: WRITE,
        trailing_segment: false,
    },
    Route {
        prefix: "show-session-key/",
        endpoint: Endpoint::ShowSessionKey,
        operations: WRITE,
        trailing_segment: false,
    },
];

/// A resolved request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matched<'a> {
    pub endpoint: Endpoint,
    /// The key name, already validated. Empty for [`Endpoint::KeyList`].
    pub name: &'a str,
    /// The optional segment after the name, e.g. the hash algorithm of `sign/<name>/<algorithm>`.
    pub trailing: Option<&'a str>,
}

/// Resolves `path` and checks `operation` is allowed on it.
pub fn route(path: &str, operation: Operation) -> Result<Matched<'_>, EngineError> {
    if path == "keys" || path == "keys/" {
        if operation != Operation::List {
            return Err(EngineError::UnsupportedOperation {
                operation,
                path: path.to_string(),
            });
        }
        return Ok(Matched {
            endpoint: Endpoint::KeyList,
            name: "",
            trailing: None,
        });
    }

    let unsupported_path = || EngineError::UnsupportedPath {
        path: path.to_string(),
    };

    let (route, rest) = ROUTES
        .iter()
        .find_map(|route| path.strip_prefix(route.prefix).map(|rest| (route, rest)))
        .ok_or_else(unsupported_path)?;

    let (name, trailing) = match rest.split_once('/') {
        None => (rest, None),
        Some((name, trailing)) if route.trailing_segment && !trailing.contains('/') => {
            (name, Some(trailing).filter(|t| !t.is_empty()))
        }
        Some(_) => return Err(unsupported_path()),
    };
    if name.is_empty() {
        return Err(unsupported_path());
    }
    validate_name(name)?;

    if !route.operations.contains(&operation) {
        return Err(EngineError::UnsupportedOperation {
            operation,
            path: path.to_string(),
        });
    }

    Ok(Matched {
        endpoint: route.endpoint,
        name,
        trailing,
    })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn kind(path: &str, operation: Operation) -> &'static str {
        route(path, operation).unwrap_err().kind()
    }

    #[test]
    fn test_routes() {
        let m = route("keys/test", Operation::Create).unwrap();
        assert_eq!(m.endpoint, Endpoint::Keys);
        assert_eq!(m.name, "test");

        assert_eq!(route("keys/", Operation::List).unwrap().endpoint, Endpoint::KeyList);
        assert_eq!(route("keys", Operation::List).unwrap().endpoint, Endpoint::KeyList);
        assert_eq!(route("export/k", Operation::Read).unwrap().endpoint, Endpoint::Export);
        assert_eq!(
            route("show-session-key/k", Operation::Update).unwrap().endpoint,
            Endpoint::ShowSessionKey
        );
        assert_eq!(route("decrypt/k", Operation::Create).unwrap().endpoint, Endpoint::Decrypt);
        assert_eq!(route("verify/k", Operation::Update).unwrap().endpoint, Endpoint::Verify);
    }

    #[test]
    fn test_sign_algorithm_segment() {
        let m = route("sign/k/sha2-512", Operation::Update).unwrap();
        assert_eq!(m.endpoint, Endpoint::Sign);
        assert_eq!(m.name, "k");
        assert_eq!(m.trailing, Some("sha2-512"));

        assert_eq!(route("sign/k", Operation::Create).unwrap().trailing, None);
        assert_eq!(route("sign/k/", Operation::Create).unwrap().trailing, None);
        assert_eq!(kind("sign/k/a/b", Operation::Update), "unsupported-path");
        assert_eq!(kind("verify/k/sha2-512", Operation::Update), "unsupported-path");
    }

    #[test]
    fn test_route_errors() {
        assert_eq!(kind("unknown/k", Operation::Read), "unsupported-path");
        assert_eq!(kind("export/", Operation::Read), "unsupported-path");
        assert_eq!(kind("keys/bad name", Operation::Read), "name-invalid");
        assert_eq!(kind("keys/-bad", Operation::Read), "name-invalid");
        assert_eq!(kind("export/k", Operation::Update), "unsupported-operation");
        assert_eq!(kind("sign/k", Operation::Read), "unsupported-operation");
        assert_eq!(kind("keys/", Operation::Read), "unsupported-operation");
        assert_eq!(kind("keys/k", Operation::List), "unsupported-operation");
    }
}
