//! Build context and Go build-constraint evaluation.
//!
//! Decides whether a file takes part in the build for a target platform and
//! tag set: `//go:build` expressions, legacy `// +build` lines, and the
//! `_GOOS`, `_GOARCH`, `_GOOS_GOARCH` file-name suffixes.

use std::collections::BTreeSet;

use crate::core::errors::{MvpkgError, Result};

/// Operating systems recognised in file-name suffixes.
pub const KNOWN_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "js", "linux",
    "nacl", "netbsd", "openbsd", "plan9", "solaris", "wasip1", "windows", "zos",
];

/// Architectures recognised in file-name suffixes.
pub const KNOWN_ARCH: &[&str] = &[
    "386", "amd64", "amd64p32", "arm", "armbe", "arm64", "arm64be", "loong64", "mips", "mipsle",
    "mips64", "mips64le", "mips64p32", "mips64p32le", "ppc", "ppc64", "ppc64le", "riscv",
    "riscv64", "s390", "s390x", "sparc", "sparc64", "wasm",
];

const UNIX_OS: &[&str] = &[
    "aix", "android", "darwin", "dragonfly", "freebsd", "hurd", "illumos", "ios", "linux",
    "netbsd", "openbsd", "solaris",
];

/// Target platform and tag selection used while loading packages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildContext {
    /// Target operating system (`GOOS`)
    pub goos: String,
    /// Target architecture (`GOARCH`)
    pub goarch: String,
    /// Whether cgo is enabled
    pub cgo: bool,
    /// Extra tags selected with `-tags`
    pub tags: BTreeSet<String>,
}

impl Default for BuildContext {
    fn default() -> Self {
        Self::host()
    }
}

impl BuildContext {
    /// Context for the machine we are running on.
    pub fn host() -> Self {
        Self {
            goos: host_goos().to_string(),
            goarch: host_goarch().to_string(),
            cgo: true,
            tags: BTreeSet::new(),
        }
    }

    /// Builder: select a target OS.
    pub fn with_goos(mut self, goos: impl Into<String>) -> Self {
        self.goos = goos.into();
        self
    }

    /// Builder: select a target architecture.
    pub fn with_goarch(mut self, goarch: impl Into<String>) -> Self {
        self.goarch = goarch.into();
        self
    }

    /// Builder: add a custom tag.
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Whether a single build tag is satisfied.
    pub fn matches_tag(&self, tag: &str) -> bool {
        if tag == self.goos || tag == self.goarch || self.tags.contains(tag) {
            return true;
        }
        match tag {
            "gc" => true,
            "cgo" => self.cgo,
            "unix" => UNIX_OS.contains(&self.goos.as_str()),
            "linux" => self.goos == "android",
            "solaris" => self.goos == "illumos",
            "darwin" => self.goos == "ios",
            _ => is_release_tag(tag),
        }
    }

    /// Whether a file name's OS/arch suffix matches this context.
    pub fn matches_file_name(&self, file_name: &str) -> bool {
        let stem = file_name.strip_suffix(".go").unwrap_or(file_name);
        let stem = stem.strip_suffix("_test").unwrap_or(stem);
        let Some((_, constrained)) = stem.split_once('_') else {
            return true;
        };

        let parts: Vec<&str> = constrained.split('_').collect();
        let n = parts.len();
        if n >= 2 && KNOWN_OS.contains(&parts[n - 2]) && KNOWN_ARCH.contains(&parts[n - 1]) {
            return self.matches_tag(parts[n - 2]) && self.matches_tag(parts[n - 1]);
        }
        let last = parts[n - 1];
        if KNOWN_OS.contains(&last) || KNOWN_ARCH.contains(&last) {
            return self.matches_tag(last);
        }
        true
    }

    /// Whether a file takes part in the build, judged from its header comments.
    pub fn matches_header(&self, source: &str) -> Result<bool> {
        let mut legacy = Vec::new();

        for line in source.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Some(comment) = trimmed.strip_prefix("//") else {
                break;
            };
            if let Some(expr) = comment.strip_prefix("go:build") {
                return Ok(ConstraintExpr::parse(expr)?.eval(self));
            }
            if let Some(options) = comment.trim_start().strip_prefix("+build") {
                legacy.push(options.to_string());
            }
        }

        Ok(legacy.iter().all(|line| self.matches_legacy_line(line)))
    }

    /// `// +build a,b !c` means (a AND b) OR (NOT c).
    fn matches_legacy_line(&self, line: &str) -> bool {
        line.split_whitespace().any(|option| {
            option.split(',').all(|term| match term.strip_prefix('!') {
                Some(tag) => !self.matches_tag(tag),
                None => self.matches_tag(term),
            })
        })
    }
}

fn is_release_tag(tag: &str) -> bool {
    tag.strip_prefix("go1.")
        .is_some_and(|minor| !minor.is_empty() && minor.chars().all(|c| c.is_ascii_digit()))
}

fn host_goos() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

fn host_goarch() -> &'static str {
    match std::env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => "ppc64",
        "loongarch64" => "loong64",
        "wasm32" => "wasm",
        other => other,
    }
}

/// Parsed `//go:build` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstraintExpr {
    /// A single tag
    Tag(String),
    /// `!x`
    Not(Box<ConstraintExpr>),
    /// `x && y`
    And(Box<ConstraintExpr>, Box<ConstraintExpr>),
    /// `x || y`
    Or(Box<ConstraintExpr>, Box<ConstraintExpr>),
}

impl ConstraintExpr {
    /// Parse the text following `//go:build`.
    pub fn parse(text: &str) -> Result<Self> {
        let tokens = tokenize(text)?;
        let mut parser = ExprParser { tokens, pos: 0 };
        let expr = parser.or()?;
        if parser.pos != parser.tokens.len() {
            return Err(MvpkgError::parse(
                "go",
                format!("unexpected token in build constraint: {}", text.trim()),
            ));
        }
        Ok(expr)
    }

    /// Evaluate against a build context.
    pub fn eval(&self, ctx: &BuildContext) -> bool {
        match self {
            Self::Tag(tag) => ctx.matches_tag(tag),
            Self::Not(inner) => !inner.eval(ctx),
            Self::And(lhs, rhs) => lhs.eval(ctx) && rhs.eval(ctx),
            Self::Or(lhs, rhs) => lhs.eval(ctx) || rhs.eval(ctx),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Tag(String),
    Not,
    And,
    Or,
    Open,
    Close,
}

fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokens = Vec::new();
    let mut chars = text.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '!' => tokens.push(Token::Not),
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '&' | '|' => {
                if chars.next_if(|(_, next)| *next == c).is_none() {
                    return Err(MvpkgError::parse(
                        "go",
                        format!("invalid operator in build constraint at column {idx}"),
                    ));
                }
                tokens.push(if c == '&' { Token::And } else { Token::Or });
            }
            c if c.is_alphanumeric() || c == '_' || c == '.' => {
                let mut tag = String::from(c);
                while let Some((_, next)) =
                    chars.next_if(|(_, n)| n.is_alphanumeric() || *n == '_' || *n == '.')
                {
                    tag.push(next);
                }
                tokens.push(Token::Tag(tag));
            }
            other => {
                return Err(MvpkgError::parse(
                    "go",
                    format!("unexpected character {other:?} in build constraint"),
                ))
            }
        }
    }

    Ok(tokens)
}

struct ExprParser {
    tokens: Vec<Token>,
    pos: usize,
}

impl ExprParser {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn or(&mut self) -> Result<ConstraintExpr> {
        let mut expr = self.and()?;
        while self.peek() == Some(&Token::Or) {
            self.pos += 1;
            expr = ConstraintExpr::Or(Box::new(expr), Box::new(self.and()?));
        }
        Ok(expr)
    }

    fn and(&mut self) -> Result<ConstraintExpr> {
        let mut expr = self.not()?;
        while self.peek() == Some(&Token::And) {
            self.pos += 1;
            expr = ConstraintExpr::And(Box::new(expr), Box::new(self.not()?));
        }
        Ok(expr)
    }

    fn not(&mut self) -> Result<ConstraintExpr> {
        if self.peek() == Some(&Token::Not) {
            self.pos += 1;
            return Ok(ConstraintExpr::Not(Box::new(self.not()?)));
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<ConstraintExpr> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        match token {
            Some(Token::Tag(tag)) => Ok(ConstraintExpr::Tag(tag)),
            Some(Token::Open) => {
                let inner = self.or()?;
                if self.peek() != Some(&Token::Close) {
                    return Err(MvpkgError::parse("go", "missing ) in build constraint"));
                }
                self.pos += 1;
                Ok(inner)
            }
            _ => Err(MvpkgError::parse("go", "incomplete build constraint")),
        }
    }
}
