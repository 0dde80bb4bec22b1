use probe_hardware::error::HwError;
use probe_hardware::util::duty_fraction;
use rstest::rstest;

#[rstest]
#[case(0.0, 0.0)]
#[case(25.0, 0.25)]
#[case(100.0, 1.0)]
fn duty_in_range_maps_to_fraction(#[case] percent: f32, #[case] expected: f64) {
    let f = duty_fraction(percent).expect("valid duty");
    assert!((f - expected).abs() < 1e-9);
}

#[rstest]
#[case(-0.5)]
#[case(100.1)]
#[case(f32::NAN)]
fn duty_out_of_range_is_rejected(#[case] percent: f32) {
    let err = duty_fraction(percent).expect_err("expected invalid duty");
    match err {
        HwError::InvalidDuty(_) => {}
        other => panic!("unexpected error: {other:?}"),
    }
}
