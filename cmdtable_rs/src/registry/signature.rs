//! Declared handler parameters and the usage line inferred from them.

use crate::option::OptSpec;

/// One fixed parameter of a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    required: bool,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Fixed parameters in binding order, plus an optional variadic tail.
///
/// The command's own options follow its declared parameters, so a handler
/// can receive an option value positionally.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    params: Vec<Param>,
    variadic: Option<String>,
}

impl Signature {
    pub fn new(params: Vec<Param>, variadic: Option<String>) -> Self {
        Self { params, variadic }
    }

    pub fn params(&self) -> &[Param] {
        &self.params
    }

    pub fn variadic(&self) -> Option<&str> {
        self.variadic.as_deref()
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| p.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }
}

/// Build a usage template from a signature: `%name [OPTIONS] ARG [OPT] [REST ...]`.
///
/// Parameters standing in for options are covered by `[OPTIONS]`.
pub fn guess_usage(signature: &Signature, options: &[OptSpec]) -> String {
    let mut usage = vec!["%name".to_string()];
    if !options.is_empty() {
        usage.push("[OPTIONS]".to_string());
    }
    for param in signature.params() {
        if options.iter().any(|o| o.ident() == param.name()) {
            continue;
        }
        let upper = param.name().to_uppercase();
        if param.is_required() {
            usage.push(upper);
        } else {
            usage.push(format!("[{upper}]"));
        }
    }
    if let Some(rest) = signature.variadic() {
        usage.push(format!("[{} ...]", rest.to_uppercase()));
    }
    usage.join(" ")
}
