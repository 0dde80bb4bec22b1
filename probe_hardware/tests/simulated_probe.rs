use probe_hardware::SimulatedProbe;
use probe_traits::Probe;

#[test]
fn sixteen_bit_register_wraps() {
    let mut p = SimulatedProbe::new(u16::MAX).with_step_every(1);
    assert_eq!(p.read_raw().unwrap(), u16::MAX);
    assert_eq!(p.read_raw().unwrap(), 0);
}

#[test]
fn boxed_probe_is_usable_as_trait_object() {
    let mut p: Box<dyn Probe> = Box::new(SimulatedProbe::new(0x9001));
    assert_eq!(p.read_bytes().unwrap(), [0x90, 0x01]);
}
