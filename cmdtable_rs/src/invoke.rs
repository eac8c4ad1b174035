//! Binding parsed values to a handler and calling it.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{BindError, DispatchError};
use crate::option::{OptionState, OptionValue};
use crate::registry::Signature;

/// Key under which [`Args`] serializes the variadic tail; no option or
/// parameter may use it as its identifier.
pub const REST_KEY: &str = "rest";

/// Values a handler is called with: named parameters plus the variadic tail.
///
/// Serializes as one object: every named value, plus `rest`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Args {
    #[serde(flatten)]
    values: BTreeMap<String, OptionValue>,
    // Must match REST_KEY.
    rest: Vec<OptionValue>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<OptionValue>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&OptionValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn text(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(OptionValue::as_str)
    }

    /// Truthiness of `name`; absent counts as false.
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).is_some_and(OptionValue::is_truthy)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(OptionValue::as_int)
    }

    pub fn float(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(OptionValue::as_float)
    }

    pub fn list(&self, name: &str) -> Option<&[String]> {
        self.get(name).and_then(OptionValue::as_list)
    }

    pub fn map(&self, name: &str) -> Option<&BTreeMap<String, String>> {
        self.get(name).and_then(OptionValue::as_map)
    }

    /// Positional values beyond the fixed parameters.
    pub fn rest(&self) -> &[OptionValue] {
        &self.rest
    }

    pub fn rest_text(&self) -> Vec<String> {
        self.rest.iter().map(ToString::to_string).collect()
    }

    /// Bound names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Wraps every handler call and every option completer.
///
/// Only the `_completion` built-in bypasses [`Middleware::call`].
pub trait Middleware: Send + Sync {
    fn call(
        &self,
        command: &str,
        args: &Args,
        next: &dyn Fn(&Args) -> anyhow::Result<i32>,
    ) -> anyhow::Result<i32>;

    fn complete(
        &self,
        _option: &str,
        partial: &str,
        next: &dyn Fn(&str) -> Vec<String>,
    ) -> Vec<String> {
        next(partial)
    }
}

/// Bind positional tokens and option values to `signature`.
///
/// When the signature has a variadic tail and more values arrive than fixed
/// parameters can take, option values whose names are fixed parameters are
/// moved into the positional sequence (in parameter order), so they are not
/// bound twice.
pub fn bind(signature: &Signature, positional: Vec<String>, state: OptionState) -> Result<Args, BindError> {
    let params = signature.params();
    let mut keywords: BTreeMap<String, OptionValue> = state.into_iter().collect();
    let mut positional: Vec<OptionValue> = positional.into_iter().map(OptionValue::Text).collect();

    if signature.variadic().is_some() && positional.len() + keywords.len() > params.len() {
        let moved: Vec<&str> = params
            .iter()
            .map(|p| p.name())
            .filter(|name| keywords.contains_key(*name))
            .collect();
        if let Some(start) = moved.first().and_then(|name| signature.position(name)) {
            debug!(?moved, start, "moving option values in front of the variadic tail");
            let at = start.min(positional.len());
            let values: Vec<OptionValue> = moved
                .iter()
                .filter_map(|name| keywords.remove(*name))
                .collect();
            positional.splice(at..at, values);
        }
    }

    let mut values = BTreeMap::new();
    let mut supplied = positional.into_iter();
    for param in params {
        match supplied.next() {
            Some(value) => {
                values.insert(param.name().to_string(), value);
            }
            None => break,
        }
    }
    let rest: Vec<OptionValue> = supplied.collect();
    if !rest.is_empty() && signature.variadic().is_none() {
        return Err(BindError::TooManyArguments {
            expected: params.len(),
            given: params.len() + rest.len(),
        });
    }

    for (name, value) in keywords {
        if values.contains_key(&name) {
            return Err(BindError::MultipleValues(name));
        }
        values.insert(name, value);
    }

    if let Some(missing) = params
        .iter()
        .find(|p| p.is_required() && !values.contains_key(p.name()))
    {
        return Err(BindError::MissingArgument(missing.name().to_string()));
    }

    Ok(Args { values, rest })
}

/// Bind and call `handler`, through `middleware` when one is set.
///
/// Binding failures become [`DispatchError::Parse`]; handler errors pass
/// through untouched.
pub(crate) fn invoke(
    command: &str,
    signature: &Signature,
    positional: Vec<String>,
    state: OptionState,
    handler: &dyn Fn(&Args) -> anyhow::Result<i32>,
    middleware: Option<&dyn Middleware>,
) -> anyhow::Result<i32> {
    let args = bind(signature, positional, state).map_err(|source| DispatchError::Parse {
        command: command.to_string(),
        source,
    })?;
    match middleware {
        Some(middleware) => middleware.call(command, &args, handler),
        None => handler(&args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Param;
    use std::sync::Mutex;

    fn state(pairs: &[(&str, OptionValue)]) -> OptionState {
        let mut state = OptionState::new();
        for (name, value) in pairs {
            state.insert(*name, value.clone());
        }
        state
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn netgraph() -> Signature {
        Signature::new(
            vec![
                Param::optional("output"),
                Param::optional("network_cache"),
                Param::optional("verbose"),
            ],
            Some("files".to_string()),
        )
    }

    fn netgraph_state() -> OptionState {
        state(&[
            ("output", "graph.db".into()),
            ("network_cache", "networks.txt".into()),
            ("verbose", OptionValue::Bool(true)),
            ("quiet", OptionValue::Bool(false)),
        ])
    }

    #[test]
    fn test_variadic_reconciliation_keeps_options_out_of_tail() {
        let args = bind(&netgraph(), strings(&["a.log", "b.log"]), netgraph_state()).unwrap();
        assert_eq!(args.text("output"), Some("graph.db"));
        assert_eq!(args.text("network_cache"), Some("networks.txt"));
        assert!(args.flag("verbose"));
        assert!(!args.flag("quiet"));
        assert_eq!(args.rest_text(), vec!["a.log", "b.log"]);
    }

    #[test]
    fn test_declared_params_bind_before_moved_options() {
        let signature = Signature::new(
            vec![Param::required("target"), Param::optional("output")],
            Some("files".to_string()),
        );
        let args = bind(
            &signature,
            strings(&["host", "x", "y"]),
            state(&[("output", "out.db".into())]),
        )
        .unwrap();
        assert_eq!(args.text("target"), Some("host"));
        assert_eq!(args.text("output"), Some("out.db"));
        assert_eq!(args.rest_text(), vec!["x", "y"]);
    }

    #[test]
    fn test_too_many_without_variadic() {
        let signature = Signature::new(vec![Param::optional("name")], None);
        let err = bind(&signature, strings(&["a", "b"]), OptionState::new()).unwrap_err();
        assert_eq!(
            err,
            BindError::TooManyArguments {
                expected: 1,
                given: 2
            }
        );
    }

    #[test]
    fn test_positional_colliding_with_option_value() {
        let signature = Signature::new(
            vec![Param::optional("name"), Param::optional("listen")],
            None,
        );
        let err = bind(
            &signature,
            strings(&["a", "b"]),
            state(&[("listen", "localhost".into())]),
        )
        .unwrap_err();
        assert_eq!(err, BindError::MultipleValues("listen".into()));
    }

    #[test]
    fn test_missing_required() {
        let signature = Signature::new(vec![Param::required("target")], None);
        let err = bind(&signature, Vec::new(), OptionState::new()).unwrap_err();
        assert_eq!(err, BindError::MissingArgument("target".into()));
    }

    #[test]
    fn test_invoke_maps_bind_errors_to_parse() {
        let signature = Signature::new(Vec::new(), None);
        let err = invoke(
            "stop",
            &signature,
            strings(&["extra"]),
            OptionState::new(),
            &|_| Ok(0),
            None,
        )
        .unwrap_err();
        let dispatch = err.downcast_ref::<DispatchError>().unwrap();
        assert_eq!(dispatch.to_string(), "stop: invalid arguments");
    }

    struct Recorder(Mutex<Vec<String>>);

    impl Middleware for Recorder {
        fn call(
            &self,
            command: &str,
            args: &Args,
            next: &dyn Fn(&Args) -> anyhow::Result<i32>,
        ) -> anyhow::Result<i32> {
            self.0.lock().unwrap().push(command.to_string());
            next(args).map(|code| code + 1)
        }
    }

    #[test]
    fn test_middleware_wraps_handler() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        let signature = Signature::new(vec![Param::optional("name")], None);
        let code = invoke(
            "serve",
            &signature,
            strings(&["all"]),
            OptionState::new(),
            &|args| Ok(args.text("name").map_or(0, str::len) as i32),
            Some(&recorder),
        )
        .unwrap();
        assert_eq!(code, 4);
        assert_eq!(recorder.0.lock().unwrap().as_slice(), ["serve"]);
    }

    #[test]
    fn test_args_serialize_flat() {
        let args = bind(&netgraph(), strings(&["a.log"]), netgraph_state()).unwrap();
        let json = serde_json::to_value(&args).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "network_cache": "networks.txt",
                "output": "graph.db",
                "quiet": false,
                "verbose": true,
                "rest": ["a.log"],
            })
        );
    }

    #[test]
    fn test_default_completer_hook_passes_through() {
        let recorder = Recorder(Mutex::new(Vec::new()));
        let out = recorder.complete("type", "b", &|partial| vec![format!("{partial}ash")]);
        assert_eq!(out, vec!["bash"]);
    }
}
