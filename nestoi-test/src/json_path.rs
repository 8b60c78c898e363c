use serde_json::Value;

/// One step of a dotted JSON path such as `data.items[2].name` or `data.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathToken {
    Field(String),
    Index(usize),
    Len,
}

/// Split a dotted path into tokens.
///
/// Panics on malformed brackets; paths are written by test authors.
pub fn tokenize_path(path: &str) -> Vec<PathToken> {
    let mut tokens = Vec::new();
    for segment in path.split('.').filter(|s| !s.is_empty()) {
        if matches!(segment, "len()" | "size()") {
            tokens.push(PathToken::Len);
            continue;
        }
        let (field, mut indices) = match segment.split_once('[') {
            Some((field, rest)) => (field, Some(rest)),
            None => (segment, None),
        };
        if !field.is_empty() {
            tokens.push(PathToken::Field(field.to_string()));
        }
        while let Some(rest) = indices {
            let (index, tail) = rest
                .split_once(']')
                .unwrap_or_else(|| panic!("unclosed bracket in JSON path `{path}`"));
            let index = index
                .parse()
                .unwrap_or_else(|_| panic!("non-numeric index `{index}` in JSON path `{path}`"));
            tokens.push(PathToken::Index(index));
            indices = tail.strip_prefix('[');
        }
    }
    tokens
}

/// Walk `root` along `path`. Missing fields and indices resolve to `null`.
pub fn resolve_path(root: &Value, path: &str) -> Value {
    let mut current = root.clone();
    for token in tokenize_path(path) {
        current = match token {
            PathToken::Field(name) => current.get(&name).cloned().unwrap_or(Value::Null),
            PathToken::Index(idx) => current.get(idx).cloned().unwrap_or(Value::Null),
            PathToken::Len => {
                let len = match &current {
                    Value::Array(a) => a.len(),
                    Value::Object(o) => o.len(),
                    Value::String(s) => s.chars().count(),
                    other => panic!("len() applied to non-collection in `{path}`: got {other}"),
                };
                Value::from(len)
            }
        };
    }
    current
}
