//! Evaluation scenarios, each run on every backend.

#[macro_use]
mod cases;

test_case!(
    add_integer,
    input: "(program 1.0.0 [(builtin addInteger) (con integer 5) (con integer 10)])",
    result: "(con integer 15)",
    budget: (402, 149308),
);
// One builtin charge for two one-word integers plus three steps

test_case!(
    lambda_around_builtin,
    input: "(program 1.0.0 [(lam x [(builtin addInteger) x (con integer 1)]) (con integer 5)])",
    result: "(con integer 6)",
    budget: (702, 197308),
);

test_case!(
    force_delay,
    input: "(program 1.0.0 (force (delay (con integer 42))))",
    result: "(con integer 42)",
    budget: (400, 48100),
);
// delay + force + constant

test_case!(
    identity,
    input: "(program 1.0.0 [(lam x x) (con integer 1)])",
    result: "(con integer 1)",
    budget: (500, 64100),
);

test_case!(
    if_then_else,
    input: "(program 1.0.0 [(force (builtin ifThenElse)) (con bool True) (con integer 1) (con integer 2)])",
    result: "(con integer 1)",
    budget: (601, 156149),
);

test_case!(
    case_on_constructor,
    input: "(program 1.1.0 (case (constr 1 (con integer 5)) (error) (lam x x)))",
    result: "(con integer 5)",
    budget: (700, 96100),
);

test_case!(
    case_applies_fields_in_order,
    input: "(program 1.1.0
        (case (constr 1 (con integer 10) (con integer 20))
          (error)
          (lam a (lam b [(builtin subtractInteger) a b]))))",
    result: "(con integer -10)",
);

test_case!(
    explicit_error,
    input: "(program 1.0.0 (error))",
    failure: ExplicitError,
);

test_case!(
    error_under_delay_is_a_value,
    input: "(program 1.0.0 (delay (error)))",
    result: "(delay (error))",
);

test_case!(
    error_under_lambda_is_a_value,
    input: "(program 1.0.0 (lam x (error)))",
    result: "(lam x (error))",
);

test_case!(
    closure_discharges_its_environment,
    input: "(program 1.0.0 [(lam x (lam y x)) (con integer 7)])",
    result: "(lam y (con integer 7))",
);

test_case!(
    partial_builtin_is_a_value,
    input: "(program 1.0.0 [(builtin addInteger) (con integer 1)])",
    result: "[(builtin addInteger) (con integer 1)]",
);

test_case!(
    forced_builtin_is_a_value,
    input: "(program 1.0.0 (force (builtin ifThenElse)))",
    result: "(force (builtin ifThenElse))",
);

test_case!(
    constr_evaluates_fields,
    input: "(program 1.1.0 (constr 2 [(lam x x) (con integer 1)] (con unit ())))",
    result: "(constr 2 (con integer 1) (con unit ()))",
);

// Integer division rounds toward negative infinity, quotient toward zero.

test_case!(
    divide_integer_floors,
    input: "(program 1.0.0 [(builtin divideInteger) (con integer -7) (con integer 2)])",
    result: "(con integer -4)",
);

test_case!(
    quotient_integer_truncates,
    input: "(program 1.0.0 [(builtin quotientInteger) (con integer -7) (con integer 2)])",
    result: "(con integer -3)",
);

test_case!(
    mod_integer_follows_divisor,
    input: "(program 1.0.0 [(builtin modInteger) (con integer -7) (con integer 2)])",
    result: "(con integer 1)",
);

test_case!(
    remainder_integer_follows_dividend,
    input: "(program 1.0.0 [(builtin remainderInteger) (con integer -7) (con integer 2)])",
    result: "(con integer -1)",
);

test_case!(
    divide_by_zero,
    input: "(program 1.0.0 [(builtin divideInteger) (con integer 1) (con integer 0)])",
    failure: BuiltinRuntimeError,
);

test_case!(
    big_integers,
    input: "(program 1.0.0 [(builtin multiplyInteger)
        (con integer 18446744073709551616) (con integer 18446744073709551616)])",
    result: "(con integer 340282366920938463463374607431768211456)",
);

test_case!(
    slice_byte_string,
    input: "(program 1.0.0 [(builtin sliceByteString) (con integer 1) (con integer 2) (con bytestring #00112233)])",
    result: "(con bytestring #1122)",
);

test_case!(
    index_byte_string_out_of_range,
    input: "(program 1.0.0 [(builtin indexByteString) (con bytestring #0102) (con integer 5)])",
    failure: BuiltinRuntimeError,
);

test_case!(
    cons_byte_string_rejects_non_bytes,
    input: "(program 1.0.0 [(builtin consByteString) (con integer 256) (con bytestring #)])",
    failure: BuiltinRuntimeError,
);

test_case!(
    sha2_256_of_empty,
    input: "(program 1.0.0 [(builtin sha2_256) (con bytestring #)])",
    result: "(con bytestring #e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855)",
);

test_case!(
    blake2b_256_of_empty,
    input: "(program 1.0.0 [(builtin blake2b_256) (con bytestring #)])",
    result: "(con bytestring #0e5751c026e543b2e8ab2eb06099daa1d1e5df47778f7787faab45cdf12fe3a8)",
);

test_case!(
    ecdsa_signature_out_of_range,
    input: "(program 1.0.0 [(builtin verifyEcdsaSecp256k1Signature) (con bytestring #0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798) (con bytestring #0000000000000000000000000000000000000000000000000000000000000000) (con bytestring #00000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000000)])",
    result: "(con bool False)",
);

test_case!(
    schnorr_signature_out_of_range,
    input: "(program 1.0.0 [(builtin verifySchnorrSecp256k1Signature) (con bytestring #79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798) (con bytestring #) (con bytestring #ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff)])",
    result: "(con bool False)",
);

test_case!(
    encode_utf8,
    input: "(program 1.0.0 [(builtin encodeUtf8) (con string \"\\u{e9}\")])",
    result: "(con bytestring #c3a9)",
);

test_case!(
    decode_invalid_utf8,
    input: "(program 1.0.0 [(builtin decodeUtf8) (con bytestring #ff)])",
    failure: BuiltinRuntimeError,
);

test_case!(
    fst_pair,
    input: "(program 1.0.0 [(force (force (builtin fstPair))) (con (pair integer bool) (1, True))])",
    result: "(con integer 1)",
);

test_case!(
    choose_list_on_empty,
    input: "(program 1.0.0 [(force (force (builtin chooseList))) (con (list integer) []) (con integer 1) (con integer 2)])",
    result: "(con integer 1)",
);

test_case!(
    mk_cons,
    input: "(program 1.0.0 [(force (builtin mkCons)) (con integer 0) (con (list integer) [1])])",
    result: "(con (list integer) [0, 1])",
);

test_case!(
    mk_cons_element_type_mismatch,
    input: "(program 1.0.0 [(force (builtin mkCons)) (con string \"x\") (con (list integer) [1])])",
    failure: TypeMismatch,
);

test_case!(
    head_of_empty_list,
    input: "(program 1.0.0 [(force (builtin headList)) (con (list integer) [])])",
    failure: BuiltinRuntimeError,
);

test_case!(
    un_constr_data,
    input: "(program 1.0.0 [(builtin unConstrData) (con data (Constr 3 [I 1]))])",
    result: "(con (pair integer (list data)) (3, [(I 1)]))",
);

test_case!(
    un_i_data_on_bytes,
    input: "(program 1.0.0 [(builtin unIData) (con data (B #00))])",
    failure: BuiltinRuntimeError,
);

test_case!(
    choose_data_picks_integer_branch,
    input: "(program 1.0.0 [(force (builtin chooseData)) (con data (I 1))
        (con integer 0) (con integer 1) (con integer 2) (con integer 3) (con integer 4)])",
    result: "(con integer 3)",
);

test_case!(
    serialise_data,
    input: "(program 1.0.0 [(builtin serialiseData) (con data (I 1))])",
    result: "(con bytestring #01)",
);

test_case!(
    trace_returns_its_second_argument,
    input: "(program 1.0.0 [(force (builtin trace)) (con string \"msg\") (con integer 9)])",
    result: "(con integer 9)",
);

// Shape errors: the language is untyped, so these surface at run time.

test_case!(
    force_a_constant,
    input: "(program 1.0.0 (force (con integer 1)))",
    failure: TypeMismatch,
);

test_case!(
    apply_a_constant,
    input: "(program 1.0.0 [(con integer 1) (con integer 2)])",
    failure: TypeMismatch,
);

test_case!(
    builtin_argument_of_wrong_type,
    input: "(program 1.0.0 [(builtin addInteger) (con integer 1) (con string \"2\")])",
    failure: TypeMismatch,
);

test_case!(
    argument_before_force,
    input: "(program 1.0.0 [(builtin ifThenElse) (con bool True) (con integer 1) (con integer 2)])",
    failure: TypeMismatch,
);

test_case!(
    case_without_branch,
    input: "(program 1.1.0 (case (constr 2) (con unit ())))",
    failure: TypeMismatch,
);

test_case!(
    case_on_non_constructor,
    input: "(program 1.1.0 (case (con integer 0) (con unit ())))",
    failure: TypeMismatch,
);
