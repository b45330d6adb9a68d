use symat::simplify;

fn stripped(s: &str) -> String {
    s.replace(' ', "")
}

/// The integral and its injection must fully evaluate: the result may not
/// mention either head.
fn check(input: &str, expected: &str) {
    let actual = simplify(input)
        .unwrap_or_else(|e| panic!("simplify failed for `{input}`: {e}"));
    assert!(
        !actual.contains("integral") && !actual.contains("inject"),
        "unevaluated integral in `{actual}` for `{input}`"
    );
    assert_eq!(
        stripped(&actual),
        stripped(expected),
        "input: `{input}`, got: `{actual}`"
    );
}

#[test]
fn integrates_constants_over_unit_interval() {
    let cases = vec![
        ("integral(0,x,0,1); variable(x)", "0.000"),
        ("integral(1,x,0,1); variable(x)", "1.000"),
        ("a*integral(1,x,0,1); variable(x)", "a"),
        ("integral(1,x,0,1)*a; variable(x)", "a"),
        ("integral(a,x,0,1); constant(a); variable(x)", "a"),
        ("integral(a+a,x,0,1); constant(a); variable(x)", "2.000 * a"),
        (
            "integral(a-b,x,0,1); constant(a); constant(b); variable(x)",
            "a - b",
        ),
    ];
    for (input, expected) in cases {
        check(input, expected);
    }
}

#[test]
fn integrates_constants_over_general_intervals() {
    let cases = vec![
        ("integral(0,x,2,4); variable(x)", "0.000"),
        ("integral(1,x,2,4); variable(x)", "2.000"),
        ("a*integral(1,x,2,4); variable(x)", "2.000 * a"),
        ("integral(a,x,2,4); constant(a); variable(x)", "2.000 * a"),
        (
            "integral(a+a,x,2,4); constant(a); variable(x)",
            "4.000 * a",
        ),
        (
            "integral(a-b,x,2,4); constant(a); constant(b); variable(x)",
            "2.000 * a - 2.000 * b",
        ),
    ];
    for (input, expected) in cases {
        check(input, expected);
    }
}

#[test]
fn integrates_monomials() {
    let cases = vec![
        ("integral(a+x,x,0,1); constant(a); variable(x)", "0.500 + a"),
        ("integral(a*x,x,0,1); constant(a); variable(x)", "0.500 * a"),
        ("integral(pow(x,2),x,0,1); variable(x)", "0.333"),
        (
            "integral(a*pow(x,2),x,0,1); variable(x); constant(a)",
            "0.333 * a",
        ),
        // the antiderivative coefficient is rounded before injection, so
        // the printed value wins over the mathematical one
        ("integral(pow(x,2),x,1,2); variable(x)", "2.331"),
        ("integral(a+x,x,2,3); constant(a); variable(x)", "2.500 + a"),
        ("integral(a*x,x,2,3); constant(a); variable(x)", "2.500 * a"),
        (
            "integral(a*x*a,x,2,3); constant(a); variable(x)",
            "2.500 * (a * a)",
        ),
        ("integral(pow(x,2),x,2,3); variable(x)", "6.327"),
        ("integral(pow(x,3),x,2,3); variable(x)", "16.250"),
        (
            "integral(pow(a*x,3),x,2,3); variable(x); constant(a)",
            "16.250 * (a * (a * a))",
        ),
        (
            "integral(a*pow(x,2),x,2,3); variable(x); constant(a)",
            "6.327 * a",
        ),
        (
            "integral(x*a*x*a*x*a,x,2,3); variable(x); constant(a)",
            "16.250 * (a * (a * a))",
        ),
        (
            "integral(a+a*pow(x,2)+pow(x,3)*a,x,2,3); variable(x); constant(a)",
            "23.577 * a",
        ),
    ];
    for (input, expected) in cases {
        check(input, expected);
    }
}

#[test]
fn extracts_trigonometric_constants() {
    check(
        "integral(sin(q)/r, s, 0.000, 1.000); constant(q,r); variable(s)",
        "sin(q) / r",
    );
    check(
        "integral(s*sin(q)/r, s, 0.000, 1.000); constant(q,r); variable(s)",
        "0.500 * sin(q) / r",
    );
    check(
        "integral(((sin(q))-(sin(q))*s)/r, s, 0.000, 1.000); constant(q); constant(r); variable(s)",
        "0.500 * (sin(q) / r)",
    );
}

#[test]
fn distributes_over_matrices() {
    check(
        "integral(transpose(matrix(a*s,1,1))*matrix(b*s,1,1)*matrix(c*s,1,1),s, 1, 2); variable(s); constant(a); constant(b); constant(c)",
        "matrix(3.750 * (a * (b * c)), 1.000, 1.000)",
    );
}

#[test]
fn fundamental_theorem_sanity() {
    let lhs = simplify("integral(d(pow(x,2),x),x,0,1); variable(x)").expect("lhs");
    let rhs =
        simplify("inject(pow(x,2),x,1) - inject(pow(x,2),x,0); variable(x)").expect("rhs");
    assert_eq!(lhs, rhs);
    assert_eq!(lhs, "1.000");
}

#[test]
fn rejects_an_undeclared_integration_variable() {
    let err = simplify("integral(pow(x,2),x,0,1)").expect_err("x is not declared");
    assert!(
        err.to_string().contains("variable of integral"),
        "unexpected error: {err}"
    );
}
