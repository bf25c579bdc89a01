// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Collapses the unique parts of runtime-generated class and method names,
//! so that e.g. every invocation of one lambda lands on the same function.

const HEX_DIGITS: &str = "0123456789abcdef";
const DIGITS: &str = "0123456789";
const LAMBDA_TRIGGER: &str = "$$Lambda$";

/// Reflection stubs generated by `sun.reflect.MethodAccessorGenerator`.
const REFLECTION_ACCESSORS: [&str; 3] = [
    "sun.reflect.GeneratedConstructorAccessor",
    "sun.reflect.GeneratedMethodAccessor",
    "sun.reflect.GeneratedSerializationConstructorAccessor",
];

/// Removes every run of `suffix_chars` directly following an occurrence of
/// `trigger`, e.g. ("foo123bar", "foo", "321") gives "foobar".
fn simplify_suffixed_name(mut name: String, trigger: &str, suffix_chars: &str) -> String {
    let mut start = 0;
    while let Some(found) = name[start..].find(trigger) {
        let first = start + found + trigger.len();
        let run = name[first..]
            .find(|c: char| !suffix_chars.contains(c))
            .unwrap_or(name.len() - first);
        name.replace_range(first..first + run, "");
        start = first;
    }
    name
}

/// `$$` followed by lowercase hex digits loses the digits, e.g. the hash in
/// `Foo$$FastClassByCGLIB$$fd6bdf6d.invoke`.
pub fn simplify_dynamic_class_name(name: String) -> String {
    simplify_suffixed_name(name, "$$", HEX_DIGITS)
}

/// `$$Lambda$<digits>.<digits>` becomes `$$Lambda$`, e.g.
/// `Something$$Lambda$197.1849072452.run` gives `Something$$Lambda$.run`.
/// Only the first occurrence is handled, and only when the exact
/// digits-dot-digits shape follows.
pub fn simplify_lambda_name(mut name: String) -> String {
    let Some(found) = name.find(LAMBDA_TRIGGER) else {
        return name;
    };
    let first = found + LAMBDA_TRIGGER.len();
    let bytes = name.as_bytes();

    let digit_run = |from: usize| {
        bytes[from..]
            .iter()
            .position(|b| !b.is_ascii_digit())
            .map_or(bytes.len(), |len| from + len)
    };

    if !bytes.get(first).is_some_and(u8::is_ascii_digit) {
        return name;
    }
    let dot = digit_run(first);
    if bytes.get(dot) != Some(&b'.') {
        return name;
    }
    if !bytes.get(dot + 1).is_some_and(u8::is_ascii_digit) {
        return name;
    }
    let last = digit_run(dot + 1);

    name.replace_range(first..last, "");
    name
}

/// Drops the sequence number of reflection accessor classes, e.g.
/// `sun.reflect.GeneratedMethodAccessor42.invoke`.
pub fn simplify_reflection_method_name(name: String) -> String {
    REFLECTION_ACCESSORS
        .iter()
        .fold(name, |name, prefix| simplify_suffixed_name(name, prefix, DIGITS))
}

/// Applies all the simplifications, dynamic classes first, then lambdas,
/// then reflection stubs.
pub fn simplify_function_name(name: &str) -> String {
    simplify_reflection_method_name(simplify_lambda_name(simplify_dynamic_class_name(
        name.to_owned(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn dynamic_classes() {
        let cases = [
            (
                "com.foo.Bar$$FastClassByCGLIB$$ab12ef34.invoke",
                "com.foo.Bar$$FastClassByCGLIB$$.invoke",
            ),
            (
                "com.foo.Bar$$EnhancerBySpringCGLIB$$fd6bdf6d.run",
                "com.foo.Bar$$EnhancerBySpringCGLIB$$.run",
            ),
            ("com.foo.Bar$$fd6bdf6d", "com.foo.Bar$$"),
            ("com.foo.Bar$$ab$$cd.run", "com.foo.Bar$$$$.run"),
            ("com.foo.Bar$$ABCD.run", "com.foo.Bar$$ABCD.run"),
            ("com.foo.Bar.run", "com.foo.Bar.run"),
        ];
        for (name, expected) in cases {
            assert_eq!(expected, simplify_function_name(name), "name {name:?}");
        }
    }

    #[test]
    fn lambdas() {
        let cases = [
            (
                "com.foo.Baz$$Lambda$197.1849072452.run",
                "com.foo.Baz$$Lambda$.run",
            ),
            ("com.foo.Baz$$Lambda$197.1849072452", "com.foo.Baz$$Lambda$"),
            // The shape after the trigger must be digits, dot, digits.
            ("com.foo.Baz$$Lambda$197.run", "com.foo.Baz$$Lambda$197.run"),
            ("com.foo.Baz$$Lambda$197", "com.foo.Baz$$Lambda$197"),
            ("com.foo.Baz$$Lambda$.run", "com.foo.Baz$$Lambda$.run"),
            ("com.foo.Baz$$Lambda$", "com.foo.Baz$$Lambda$"),
            (
                "a.B$$Lambda$1.2.run$$Lambda$3.4.get",
                "a.B$$Lambda$.run$$Lambda$3.4.get",
            ),
        ];
        for (name, expected) in cases {
            assert_eq!(expected, simplify_lambda_name(name.to_owned()), "name {name:?}");
        }
    }

    #[test]
    fn reflection_stubs() {
        let cases = [
            (
                "sun.reflect.GeneratedMethodAccessor42.invoke",
                "sun.reflect.GeneratedMethodAccessor.invoke",
            ),
            (
                "sun.reflect.GeneratedConstructorAccessor7.newInstance",
                "sun.reflect.GeneratedConstructorAccessor.newInstance",
            ),
            (
                "sun.reflect.GeneratedSerializationConstructorAccessor123.newInstance",
                "sun.reflect.GeneratedSerializationConstructorAccessor.newInstance",
            ),
            (
                "sun.reflect.NativeMethodAccessorImpl.invoke",
                "sun.reflect.NativeMethodAccessorImpl.invoke",
            ),
        ];
        for (name, expected) in cases {
            assert_eq!(expected, simplify_function_name(name), "name {name:?}");
        }
    }

    proptest! {
        #[test]
        fn simplification_only_removes(name in "[a-f0-9.$L]{0,48}") {
            let simplified = simplify_function_name(&name);
            prop_assert!(simplified.len() <= name.len());
            prop_assert_eq!(
                simplified.chars().filter(|c| *c == '$').count(),
                name.chars().filter(|c| *c == '$').count()
            );
        }

        #[test]
        fn names_without_triggers_are_untouched(name in "[a-zA-Z0-9.]{0,48}") {
            prop_assume!(!name.contains("sun.reflect.Generated"));
            prop_assert_eq!(simplify_function_name(&name), name);
        }
    }
}
