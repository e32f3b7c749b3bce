// SPDX-License-Identifier: MIT OR Apache-2.0
//! Distribute a wrist twist across two forearm joints.
//!
//! Builds a four-joint arm, extracts the wrist's X twist relative to the
//! elbow, and prints how the forearm links absorb it - first uniformly
//! weighted, then after retuning the falloff knob.

use glam::{Mat4, Quat};
use rigweave_chain::{BodyId, Chain, MemoryScene, RigConfig, TwistRig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rigweave_chain=info".into()),
        )
        .init();

    let mut scene = MemoryScene::new();
    scene.insert_joint(
        "wrist",
        Mat4::from_quat(Quat::from_rotation_x(30f32.to_radians())),
    );
    scene.insert_joint("elbow", Mat4::IDENTITY);
    scene.insert_joint("forearm1", Mat4::IDENTITY);
    scene.insert_joint("forearm2", Mat4::IDENTITY);

    let chain = Chain::from_selection(
        ["wrist", "elbow", "forearm1", "forearm2"]
            .into_iter()
            .map(BodyId::from)
            .collect(),
    )?;
    let mut rig = TwistRig::build(chain, RigConfig::default(), &scene)?;

    println!("extracted: {:.1} deg", rig.extracted_angle()?.to_degrees());
    for binding in rig.bindings().to_vec() {
        println!(
            "  {} {} = {:.1} deg",
            binding.body,
            binding.axis.attribute(),
            rig.read(binding.value)?.to_degrees()
        );
    }

    // The wrist keeps turning; the graph stays live.
    let wrist = BodyId::from("wrist");
    scene.set_world(
        &wrist,
        Mat4::from_quat(Quat::from_rotation_x(90f32.to_radians())),
    );
    rig.refresh_from(&scene)?;
    println!("wrist cranked to {:.1} deg", rig.extracted_angle()?.to_degrees());

    // Bias the twist towards the wrist end of the chain.
    rig.set_falloff_values(0.25, 0.75)?;
    for binding in rig.bindings().to_vec() {
        println!(
            "  {} {} = {:.1} deg",
            binding.body,
            binding.axis.attribute(),
            rig.read(binding.value)?.to_degrees()
        );
    }

    Ok(())
}
