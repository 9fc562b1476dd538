//! Environment-variable expansion for definition files.
//!
//! Definition files may embed `{{ env("NAME", "default") }}` and
//! `{{ must_env("NAME") }}`. Any other undefined name is an error.
//!
//! Only `{{ }}` is template syntax. Block and comment delimiters start with a
//! NUL byte, which cannot appear in a JSON or YAML file, so shell snippets
//! such as `${#VAR}` or `{% raw %}` pass through untouched.

use minijinja::syntax::SyntaxConfig;
use minijinja::{context, Environment, Error, ErrorKind, UndefinedBehavior};

fn env(name: String, default: Option<String>) -> String {
    std::env::var(&name).unwrap_or_else(|_| default.unwrap_or_default())
}

fn must_env(name: String) -> Result<String, Error> {
    std::env::var(&name).map_err(|_| {
        Error::new(
            ErrorKind::InvalidOperation,
            format!("environment variable {} is not defined", name),
        )
    })
}

/// Render `source` with the `env` / `must_env` functions available.
pub fn render(source: &str) -> Result<String, String> {
    let syntax = SyntaxConfig::builder()
        .variable_delimiters("{{", "}}")
        .block_delimiters("\0{%", "%}\0")
        .comment_delimiters("\0{#", "#}\0")
        .build()
        .map_err(|e| e.to_string())?;

    let mut environment = Environment::new();
    environment.set_syntax(syntax);
    environment.set_undefined_behavior(UndefinedBehavior::Strict);
    environment.add_function("env", env);
    environment.add_function("must_env", must_env);
    environment
        .render_str(source, context! {})
        .map_err(|e| e.to_string())
}
