use crate::debugger::rpc::api::Variable;
use crate::debugger::{Debugger, Error};

/// Split `lhs = rhs` assignment at the first top-level `=`.
///
/// `==`, `!=`, `<=` and `>=` are comparisons, `=` inside brackets or literals is ignored.
/// Compound assignments (`+=`, `:=`, etc.) are rejected.
pub fn split_assignment(expr: &str) -> Result<(&str, &str), Error> {
    let bytes = expr.as_bytes();
    let mut depth = 0_i32;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            quote @ (b'"' | b'\'') => {
                i += 1;
                while i < bytes.len() && bytes[i] != quote {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'`' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'`' {
                    i += 1;
                }
            }
            b'=' if depth == 0 => {
                let next = bytes.get(i + 1).copied();
                let prev = i.checked_sub(1).map(|p| bytes[p]);
                if next == Some(b'=') {
                    // comparison, skip both symbols
                    i += 2;
                    continue;
                }
                match prev {
                    Some(b'!' | b'<' | b'>') => {}
                    Some(b'+' | b'-' | b'*' | b'/' | b'%' | b'&' | b'|' | b'^' | b':') => {
                        return Err(Error::InvalidArgument(format!(
                            "unsupported assignment operator in '{expr}'"
                        )));
                    }
                    _ => {
                        let lhs = expr[..i].trim();
                        let rhs = expr[i + 1..].trim();
                        if lhs.is_empty() || rhs.is_empty() {
                            return Err(Error::InvalidArgument(format!(
                                "malformed assignment '{expr}'"
                            )));
                        }
                        return Ok((lhs, rhs));
                    }
                }
            }
            _ => {}
        }
        i += 1;
    }

    Err(Error::InvalidArgument("syntax error '=' not found".to_string()))
}

impl Debugger {
    /// Evaluate expression in the selected scope.
    pub fn eval(&self, expr: &str) -> Result<Variable, Error> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(Error::InvalidArgument("not enough arguments".to_string()));
        }
        self.client
            .eval(self.selection.scope(), expr, self.config.load_config())
    }

    /// Execute `lhs = rhs` assignment in the selected scope.
    pub fn set_variable(&self, assignment: &str) -> Result<(), Error> {
        let (symbol, value) = split_assignment(assignment)?;
        self.client
            .set_variable(self.selection.scope(), symbol, value)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_split_assignment() {
        struct TestCase {
            input: &'static str,
            expected: Option<(&'static str, &'static str)>,
        }
        let test_cases = vec![
            TestCase {
                input: "x = 5",
                expected: Some(("x", "5")),
            },
            TestCase {
                input: "a.b[i==1] = c == d",
                expected: Some(("a.b[i==1]", "c == d")),
            },
            TestCase {
                input: "m[\"k=v\"]=f(a, b=c)",
                expected: Some(("m[\"k=v\"]", "f(a, b=c)")),
            },
            TestCase {
                input: "s = `raw=string`",
                expected: Some(("s", "`raw=string`")),
            },
            TestCase {
                input: "c = '='",
                expected: Some(("c", "'='")),
            },
            TestCase {
                input: "a != b",
                expected: None,
            },
            TestCase {
                input: "a <= b",
                expected: None,
            },
            TestCase {
                input: "a >= b",
                expected: None,
            },
            TestCase {
                input: "a == b",
                expected: None,
            },
            TestCase {
                input: "x += 1",
                expected: None,
            },
            TestCase {
                input: "x := 1",
                expected: None,
            },
            TestCase {
                input: "= 1",
                expected: None,
            },
            TestCase {
                input: "x =",
                expected: None,
            },
            TestCase {
                input: "x",
                expected: None,
            },
        ];

        for tc in test_cases {
            let result = split_assignment(tc.input);
            match tc.expected {
                Some(expected) => assert_eq!(result.unwrap(), expected, "{}", tc.input),
                None => assert!(
                    matches!(result, Err(Error::InvalidArgument(_))),
                    "{}",
                    tc.input
                ),
            }
        }
    }
}
