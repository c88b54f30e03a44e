use solis::prelude::*;
use glam::{Mat3, Vec3};

#[test]
fn spinning_a_sky() {
    let _ = env_logger::builder().is_test(true).try_init();

    let mut engine = Engine::new(EngineConfig::default());
    let sky = EnvironmentBuilder::new()
        .with_reflections(TextureRef::cubemap(TextureId::new(1), 512, 10))
        .with_radiance_sh(3, &[Vec3::new(0.8, 0.9, 1.0); 9])
        .with_intensity(20_000.0)
        .build(&mut engine)
        .unwrap();

    for frame in 0..4 {
        let environment = engine.environment_mut(sky).unwrap();
        environment.set_rotation(solis::core::rotation::yaw(frame as f32 * 0.1));
        engine.prepare().unwrap();
    }

    let environment = engine.environment(sky).unwrap();
    assert!(environment.has_contribution());
    assert!(!environment.is_dirty());
    assert!(environment.rotation().abs_diff_eq(Mat3::from_rotation_y(0.3), 1e-6));

    assert!(engine.destroy_environment(sky));
    assert_eq!(engine.device().allocated_bytes(), 0);
}
