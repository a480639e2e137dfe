//! Ninja syntax: rules, edges and a text writer
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

/// A named command template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    pub name: String,
    pub command: String,
    pub description: Option<String>,
    /// Dependency file written by the command (`$out.d` for gcc)
    pub depfile: Option<String>,
    /// Dependency format understood by the executor (`gcc` or `msvc`)
    pub deps: Option<String>,
}

impl Rule {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            description: None,
            depfile: None,
            deps: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_depfile(mut self, depfile: impl Into<String>) -> Self {
        self.depfile = Some(depfile.into());
        self
    }

    pub fn with_deps(mut self, deps: impl Into<String>) -> Self {
        self.deps = Some(deps.into());
        self
    }
}

/// One build statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub rule: String,
    pub outputs: Vec<PathBuf>,
    pub implicit_outputs: Vec<PathBuf>,
    pub inputs: Vec<PathBuf>,
    pub implicit_inputs: Vec<PathBuf>,
    /// Edge-scoped variable bindings, values written literally
    pub variables: Vec<(String, String)>,
}

impl Edge {
    pub fn new(rule: impl Into<String>, outputs: Vec<PathBuf>, inputs: Vec<PathBuf>) -> Self {
        Self {
            rule: rule.into(),
            outputs,
            implicit_outputs: Vec::new(),
            inputs,
            implicit_inputs: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// A `phony` alias from a target name to its outputs
    pub fn phony(name: &str, inputs: Vec<PathBuf>) -> Self {
        Self::new("phony", vec![PathBuf::from(name)], inputs)
    }

    pub fn with_implicit_inputs(mut self, implicit: Vec<PathBuf>) -> Self {
        self.implicit_inputs = implicit;
        self
    }

    pub fn with_implicit_outputs(mut self, implicit: Vec<PathBuf>) -> Self {
        self.implicit_outputs = implicit;
        self
    }

    pub fn with_variable(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.variables.push((key.into(), value.into()));
        self
    }

    /// Look up an edge-scoped variable
    pub fn variable(&self, key: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Escape a path for use in a build statement
pub fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '$' => escaped.push_str("$$"),
            ' ' => escaped.push_str("$ "),
            ':' => escaped.push_str("$:"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Escape a variable value so it is taken literally
pub fn escape_value(value: &str) -> String {
    value.replace('$', "$$")
}

/// Expand `$name` references in a command template
///
/// `$$` yields a literal `$`. Unknown names expand to nothing and runs of
/// whitespace collapse, matching how the executor would run the command.
pub fn expand(template: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut expanded = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            expanded.push(c);
            continue;
        }
        if chars.peek() == Some(&'$') {
            chars.next();
            expanded.push('$');
            continue;
        }

        let mut name = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_ascii_alphanumeric() || next == '_' {
                name.push(next);
                chars.next();
            } else {
                break;
            }
        }
        if let Some(value) = lookup(&name) {
            expanded.push_str(&value);
        }
    }

    expanded.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Accumulates Ninja text in memory
#[derive(Debug, Default)]
pub struct NinjaWriter {
    out: String,
}

impl NinjaWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn comment(&mut self, text: &str) -> &mut Self {
        for line in text.lines() {
            let _ = writeln!(self.out, "# {}", line);
        }
        self
    }

    pub fn newline(&mut self) -> &mut Self {
        self.out.push('\n');
        self
    }

    /// Top-level variable binding, value written literally
    pub fn variable(&mut self, key: &str, value: &str) -> &mut Self {
        let _ = writeln!(self.out, "{} = {}", key, escape_value(value));
        self
    }

    pub fn rule(&mut self, rule: &Rule) -> &mut Self {
        let _ = writeln!(self.out, "rule {}", rule.name);
        // Rule commands are templates: `$in`, `$out` and friends must survive.
        let _ = writeln!(self.out, "  command = {}", rule.command);
        if let Some(description) = &rule.description {
            let _ = writeln!(self.out, "  description = {}", description);
        }
        if let Some(depfile) = &rule.depfile {
            let _ = writeln!(self.out, "  depfile = {}", depfile);
        }
        if let Some(deps) = &rule.deps {
            let _ = writeln!(self.out, "  deps = {}", deps);
        }
        self.newline()
    }

    pub fn build(&mut self, edge: &Edge) -> &mut Self {
        let mut line = String::from("build");
        push_paths(&mut line, &edge.outputs);
        if !edge.implicit_outputs.is_empty() {
            line.push_str(" |");
            push_paths(&mut line, &edge.implicit_outputs);
        }
        line.push_str(": ");
        line.push_str(&edge.rule);
        push_paths(&mut line, &edge.inputs);
        if !edge.implicit_inputs.is_empty() {
            line.push_str(" |");
            push_paths(&mut line, &edge.implicit_inputs);
        }

        let _ = writeln!(self.out, "{}", line);
        for (key, value) in &edge.variables {
            let _ = writeln!(self.out, "  {} = {}", key, escape_value(value));
        }
        self.newline()
    }

    pub fn subninja(&mut self, path: &Path) -> &mut Self {
        let _ = writeln!(self.out, "subninja {}", escape_path(&path.to_string_lossy()));
        self
    }

    pub fn defaults(&mut self, targets: &[&str]) -> &mut Self {
        let targets: Vec<_> = targets.iter().map(|t| escape_path(t)).collect();
        let _ = writeln!(self.out, "default {}", targets.join(" "));
        self
    }

    /// Consume the writer, returning the accumulated text
    pub fn finish(self) -> String {
        self.out
    }
}

fn push_paths(line: &mut String, paths: &[PathBuf]) {
    for path in paths {
        line.push(' ');
        line.push_str(&escape_path(&path.to_string_lossy()));
    }
}
