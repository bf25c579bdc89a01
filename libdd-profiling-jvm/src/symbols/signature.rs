// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Parser and pretty printer for JVM type descriptors, e.g.
//! `(I[Ljava/lang/String;)V` becomes `void (int, java.lang.String[])`.
//!
//! Malformed input never fails: the offending part is replaced by an
//! `<error: ...>` placeholder and parsing carries on.

pub const END_OF_BUFFER_ERROR: &str = "<error: end of buffer reached>";
pub const END_OF_STRING_ERROR: &str = "<error: end of string reached>";
pub const UNKNOWN_TYPE_ERROR: &str = "<error: unknown type>";
pub const MISSING_CLOSING_PAREN_ERROR: &str = " <Method Signature Error: no ')'>";

/// A cursor over a descriptor. Nested method types re-enter the method
/// grammar with the same cursor.
struct SignatureParser<'a> {
    buffer: &'a [u8],
    pos: usize,
}

impl<'a> SignatureParser<'a> {
    fn new(descriptor: &'a str) -> Self {
        Self {
            buffer: descriptor.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.buffer.get(self.pos).copied()
    }

    fn at_signature_end(&self) -> bool {
        matches!(self.peek(), None | Some(b')'))
    }

    fn parse_field_type(&mut self) -> String {
        let Some(tag) = self.peek() else {
            return END_OF_BUFFER_ERROR.to_owned();
        };
        self.pos += 1;

        match tag {
            b'B' => "byte".to_owned(),
            b'C' => "char".to_owned(),
            b'D' => "double".to_owned(),
            b'F' => "float".to_owned(),
            b'I' => "int".to_owned(),
            b'J' => "long".to_owned(),
            b'S' => "short".to_owned(),
            b'Z' => "boolean".to_owned(),
            b'V' => "void".to_owned(),
            b'L' => {
                let rest = &self.buffer[self.pos..];
                match rest.iter().position(|&b| b == b';') {
                    Some(len) => {
                        self.pos += len + 1;
                        String::from_utf8_lossy(&rest[..len]).into_owned()
                    }
                    None => {
                        self.pos = self.buffer.len();
                        END_OF_STRING_ERROR.to_owned()
                    }
                }
            }
            b'[' => {
                let mut element = self.parse_field_type();
                element.push_str("[]");
                element
            }
            b'(' => {
                // The method grammar wants to consume the '(' itself.
                self.pos -= 1;
                self.parse_method_type_with_return()
            }
            _ => UNKNOWN_TYPE_ERROR.to_owned(),
        }
    }

    /// Parses `(args...)`. Returns an empty string if the cursor is not on
    /// a '('.
    fn parse_method_type(&mut self) -> String {
        if self.peek() != Some(b'(') {
            return String::new();
        }
        self.pos += 1;

        let mut out = String::from("(");
        while !self.at_signature_end() {
            out.push_str(&self.parse_field_type());
            if !self.at_signature_end() {
                out.push_str(", ");
            }
        }

        if self.peek().is_some() {
            self.pos += 1;
            out.push(')');
        } else {
            out.push_str(MISSING_CLOSING_PAREN_ERROR);
        }
        out
    }

    fn parse_method_type_with_return(&mut self) -> String {
        let arguments = self.parse_method_type();
        if arguments.is_empty() || !arguments.ends_with(')') {
            return arguments;
        }

        let return_type = self.parse_field_type();
        format!("{return_type} {arguments}")
    }
}

/// Turns JVM package separators into Java ones.
pub fn fix_path(s: &mut String) {
    if s.contains('/') {
        *s = s.replace('/', ".");
    }
}

/// Pretty-prints the argument list of a method descriptor in place, e.g.
/// `(JLjava/lang/Object;)Z` becomes `(long, java.lang.Object)`. Strings not
/// starting with '(' are left untouched.
pub fn fix_method_parameters(signature: &mut String) {
    if !signature.starts_with('(') {
        return;
    }

    fix_path(signature);
    *signature = SignatureParser::new(signature).parse_method_type();
}

/// Pretty-prints a single field descriptor in place, e.g.
/// `[Ljava/lang/String;` becomes `java.lang.String[]`.
pub fn pretty_print_signature(signature: &mut String) {
    let mut result = SignatureParser::new(signature).parse_field_type();
    fix_path(&mut result);
    *signature = result;
}

/// Pretty-prints a whole method descriptor, return type first, without
/// touching package separators.
pub fn parse_method_type_signature_with_return(descriptor: &str) -> String {
    SignatureParser::new(descriptor).parse_method_type_with_return()
}

/// Whether a rendered signature contains a parse error placeholder.
pub fn has_signature_error(rendered: &str) -> bool {
    rendered.contains("<error: ") || rendered.contains(MISSING_CLOSING_PAREN_ERROR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(signature: &str) -> String {
        let mut signature = signature.to_owned();
        fix_method_parameters(&mut signature);
        signature
    }

    #[test]
    fn method_with_return() {
        let mut descriptor = String::from("(I[Ljava/lang/String;)V");
        fix_path(&mut descriptor);
        assert_eq!(
            "void (int, java.lang.String[])",
            parse_method_type_signature_with_return(&descriptor)
        );
    }

    #[test]
    fn method_parameters() {
        assert_eq!("()", fixed("()V"));
        assert_eq!("(int, java.lang.String[])", fixed("(I[Ljava/lang/String;)V"));
        assert_eq!(
            "(byte, char, double, float, int, long, short, boolean)",
            fixed("(BCDFIJSZ)V")
        );
        assert_eq!("(int[][], java.util.Map)", fixed("([[ILjava/util/Map;)J"));
    }

    #[test]
    fn nested_method_types() {
        assert_eq!("(int, void (long))", fixed("(I(J)V)V"));
    }

    #[test]
    fn not_a_method_descriptor() {
        assert_eq!("", fixed(""));
        assert_eq!("Ljava/lang/String;", fixed("Ljava/lang/String;"));
    }

    #[test]
    fn errors_are_embedded() {
        assert_eq!(
            format!("(int{MISSING_CLOSING_PAREN_ERROR}"),
            fixed("(I")
        );
        assert_eq!(
            format!("(int, {UNKNOWN_TYPE_ERROR})"),
            fixed("(IX)V")
        );
        assert_eq!(
            format!("({END_OF_STRING_ERROR}{MISSING_CLOSING_PAREN_ERROR}"),
            fixed("(Ljava/lang/String")
        );
        assert_eq!(
            format!("({END_OF_BUFFER_ERROR}[]{MISSING_CLOSING_PAREN_ERROR}"),
            fixed("([")
        );
        assert!(has_signature_error(&fixed("(IX)V")));
        assert!(!has_signature_error(&fixed("(IJ)V")));
    }

    #[test]
    fn return_type_errors() {
        assert_eq!(
            format!("{END_OF_BUFFER_ERROR} (int)"),
            parse_method_type_signature_with_return("(I)")
        );
        assert_eq!(
            format!("(int{MISSING_CLOSING_PAREN_ERROR}"),
            parse_method_type_signature_with_return("(I")
        );
        assert_eq!("", parse_method_type_signature_with_return("I"));
    }

    #[test]
    fn field_types() {
        let cases = [
            ("I", "int"),
            ("[Ljava/lang/String;", "java.lang.String[]"),
            ("[[D", "double[][]"),
            ("Ljava/util/List;", "java.util.List"),
            ("", END_OF_BUFFER_ERROR),
            ("Q", UNKNOWN_TYPE_ERROR),
        ];
        for (descriptor, expected) in cases {
            let mut signature = descriptor.to_owned();
            pretty_print_signature(&mut signature);
            assert_eq!(expected, signature, "descriptor {descriptor:?}");
        }
    }

    #[test]
    fn non_ascii_class_names() {
        assert_eq!("(café.Menu, int)", fixed("(Lcafé/Menu;I)V"));
        // An unknown multi-byte tag must not split the buffer mid-char.
        assert!(has_signature_error(&fixed("(é)V")));
    }
}
