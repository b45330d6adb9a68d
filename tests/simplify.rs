use symat::simplify;

fn stripped(s: &str) -> String {
    s.replace(' ', "")
}

fn check(input: &str, expected: &str) {
    let actual = simplify(input)
        .unwrap_or_else(|e| panic!("simplify failed for `{input}`: {e}"));
    assert_eq!(
        stripped(&actual),
        stripped(expected),
        "input: `{input}`, got: `{actual}`"
    );
}

#[test]
fn folds_literal_arithmetic() {
    let cases = vec![
        ("1+2", "3.000"),
        ("2*((((9.01)+3)))", "24.020"),
        ("2*((((9)+3)))", "24.000"),
        ("(9+3)*2", "24.000"),
        ("12*(2+6*6)+16/4-90/1", "370.000"),
        ("2*(3+4)-5", "9.000"),
    ];
    for (input, expected) in cases {
        check(input, expected);
    }
}

#[test]
fn collects_and_distributes_products() {
    let cases = vec![
        ("a*(2+8)", "10.000 * a"),
        ("(2+8)*a", "10.000 * a"),
        ("a*(2+8)*a", "10.000 * (a * a)"),
        ("((a))*(((2+8)))*(a)", "10.000 * (a * a)"),
        ("(2+8*a)*a", "2.000 * a + 8.000 * (a * a)"),
        ("b*(2+8*a); constant(a); constant(b)", "2.000 * b + 8.000 * (a * b)"),
        ("b*(2+3+8*a); constant(a); constant(b)", "5.000 * b + 8.000 * (a * b)"),
        ("b*(2+3-1+8*a); constant(a,b)", "4.000 * b + 8.000 * (a * b)"),
        ("b/(2+3-1+a*8); constant(a,b)", "b / (4.000 + 8.000 * a)"),
        (
            "(a + b) * (c - d); constant(a,b,c,d)",
            "a * c - a * d + (b * c - b * d)",
        ),
        (
            "(a + b) * (c - d - s); constant(a,b,c,d,s)",
            "a * c - a * d - a * s + (b * c - b * d - b * s)",
        ),
    ];
    for (input, expected) in cases {
        check(input, expected);
    }
}

#[test]
fn expands_integer_powers() {
    let cases = vec![
        ("pow(4,2)", "16.000"),
        ("pow(a,2)", "a * a"),
        ("pow(a,3)", "a * (a * a)"),
        ("pow(a,5-3+1)", "a * (a * a)"),
        ("pow(a+b,5-4)", "a + b"),
        ("pow(a+1,2)", "1.000 + 2.000 * a + a * a"),
        (
            "pow(a+b,4/2); constant(a,b)",
            "a * a + 2.000 * (a * b) + b * b",
        ),
        ("pow(2,pow(1,-1))", "2.000"),
        ("pow(1,pow(4,1))", "1.000"),
        // a non-integer exponent stays symbolic, at printed precision
        ("pow(2,pow(4,-2))", "pow(2.000, 0.062)"),
    ];
    for (input, expected) in cases {
        check(input, expected);
    }
}

#[test]
fn handles_signs_and_zeros() {
    let cases = vec![
        ("-1+(-a)+(+5)+(+2+3+1); constant(a)", "10.000 - a"),
        (
            "pow(9,9)*4*(-3+3)*0+12.3*0-wer*0-0*wed; constant(wer,wed)",
            "0.000",
        ),
        ("0 - a; constant(a)", "-a"),
        ("a - 0; constant(a)", "a"),
    ];
    for (input, expected) in cases {
        check(input, expected);
    }
}

#[test]
fn normalizes_division_chains() {
    let cases = vec![
        ("(a/b)/(c/d)", "a * d / (b * c)"),
        ("a/(c/d)", "a * d / c"),
        ("6.000 / L * (0.333 / L); constant(L)", "1.998 / (L * L)"),
        ("l*(l*(1.000/l*(1.000/l*l)))", "l"),
    ];
    for (input, expected) in cases {
        check(input, expected);
    }
}

#[test]
fn declarations_may_surround_the_base_expression() {
    check("constant(a,b); b*(2+8*a)", "2.000 * b + 8.000 * (a * b)");
    check("constant(a); b*(2+8*a); constant(b)", "2.000 * b + 8.000 * (a * b)");
}
