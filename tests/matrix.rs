use symat::simplify;

fn stripped(s: &str) -> String {
    s.replace(' ', "")
}

fn check(input: &str, expected: &str) {
    let actual = simplify(input)
        .unwrap_or_else(|e| panic!("simplify failed for `{input}`: {e}"));
    assert!(
        !actual.contains("transpose") && !actual.contains("det(") && !actual.contains("inverse"),
        "unevaluated matrix operation in `{actual}` for `{input}`"
    );
    assert_eq!(
        stripped(&actual),
        stripped(expected),
        "input: `{input}`, got: `{actual}`"
    );
}

#[test]
fn folds_entries_and_multiplies() {
    let cases = vec![
        ("matrix(2+5,1,1)", "matrix(7.000, 1.000, 1.000)"),
        (
            "matrix(2+5,1,1)*matrix(1-2,1,1)",
            "matrix(-7.000, 1.000, 1.000)",
        ),
        (
            "matrix(2+5,9,3, 5-1+0-0,2,2)*matrix(1-2,+5,2,1)",
            "matrix(38.000, 17.000, 2.000, 1.000)",
        ),
        (
            "transpose(matrix(2+5,9,3, 5-1+0-0,2,2))*matrix(1-2,+5,2,1)",
            "matrix(8.000, 11.000, 2.000, 1.000)",
        ),
    ];
    for (input, expected) in cases {
        check(input, expected);
    }
}

#[test]
fn broadcasts_scalars_over_entries() {
    let cases = vec![
        ("2*matrix(2+5,1,1)", "matrix(14.000, 1.000, 1.000)"),
        ("matrix(5+2,1,1)*2", "matrix(14.000, 1.000, 1.000)"),
        ("a*matrix(2+5,1,1)", "matrix(7.000 * a, 1.000, 1.000)"),
        ("matrix(5+2,1,1)*a", "matrix(7.000 * a, 1.000, 1.000)"),
        (
            "matrix(5+a,1,1)*a",
            "matrix(5.000 * a + a * a, 1.000, 1.000)",
        ),
        (
            "matrix(5+a,4,0,-2*a,2,2)*a",
            "matrix(5.000 * a + a * a, 4.000 * a, 0.000, -2.000 * (a * a), 2.000, 2.000)",
        ),
        ("matrix(4,6,1,2)/2", "matrix(2.000, 3.000, 1.000, 2.000)"),
    ];
    for (input, expected) in cases {
        check(input, expected);
    }
}

#[test]
fn adds_and_transposes() {
    check(
        "matrix(1,2,2,1)+matrix(3,4,2,1)",
        "matrix(4.000, 6.000, 2.000, 1.000)",
    );
    check(
        "matrix(3,4,2,1)-matrix(1,2,2,1)",
        "matrix(2.000, 2.000, 2.000, 1.000)",
    );
    check(
        "transpose(transpose(matrix(1,2,3,4,5,6,2,3)))",
        "matrix(1.000, 2.000, 3.000, 4.000, 5.000, 6.000, 2.000, 3.000)",
    );
}

#[test]
fn computes_determinants() {
    let cases = vec![
        ("det(matrix(a,b,c,d,2,2))", "a * d - b * c"),
        ("det(matrix(-2,2,-3,-1,1,3,2,0,1,3,3))", "18.000"),
        ("det(matrix(-1,1.5,1,-1,2,2))", "-0.500"),
        (
            "det(matrix(a,b,c,d,e,f,g,h,i,3,3))",
            "a * (e * i) - a * (f * h) - (b * (d * i) - b * (f * g)) + (c * (d * h) - c * (e * g))",
        ),
    ];
    for (input, expected) in cases {
        check(input, expected);
    }
}

#[test]
fn inverts_square_matrices() {
    check(
        "inverse(matrix(1,2,3,0,1,4,5,6,0,3,3))",
        "matrix(-24.000, 18.000, 5.000, 20.000, -15.000, -4.000, -5.000, 4.000, 1.000, 3.000, 3.000)",
    );
    check(
        "inverse(matrix(a,b,c,d,2,2))",
        "matrix(d / (a * d - b * c), -1.000 * b / (a * d - b * c), -1.000 * c / (a * d - b * c), a / (a * d - b * c), 2.000, 2.000)",
    );
}

#[test]
fn multiplication_is_associative_on_numeric_matrices() {
    let grouped_left = simplify("(matrix(1,2,3,4,2,2)*matrix(5,6,7,8,2,2))*matrix(1,0,0,1,2,2)")
        .expect("left grouping");
    let grouped_right = simplify("matrix(1,2,3,4,2,2)*(matrix(5,6,7,8,2,2)*matrix(1,0,0,1,2,2))")
        .expect("right grouping");
    assert_eq!(grouped_left, grouped_right);
    assert_eq!(
        stripped(&grouped_left),
        "matrix(19.000,22.000,43.000,50.000,2.000,2.000)"
    );
}

#[test]
fn numeric_inverse_is_a_right_inverse() {
    check(
        "matrix(2,3,1,2,2,2)*inverse(matrix(2,3,1,2,2,2))",
        "matrix(1.000, 0.000, 0.000, 1.000, 2.000, 2.000)",
    );
}

#[test]
fn rejects_invalid_shapes() {
    let cases = vec![
        "transpose(matrix(1,2,3,2,2))",
        "det(matrix(1,2,1,2))",
        "inverse(matrix(1,2,1,2))",
        "matrix(1,2,1,2)*matrix(1,2,1,2)",
        "matrix(1,2,2,1)+matrix(1,2,1,2)",
        "matrix(1,1,1)/matrix(2,1,1)",
        "transpose(a)",
    ];
    for input in cases {
        assert!(
            simplify(input).is_err(),
            "expected a shape error for `{input}`"
        );
    }
}
