//! Headless sandbox session
//!
//! Drives the simulation controller through a scripted sequence of clicks
//! and toggles without a renderer, printing the events each phase produced.
//!
//! Usage: cargo run --example headless_sandbox [settings.json]

use nalgebra::{Point3, Vector3};
use ragdoll_sandbox::{
    BendyRagdoll, Camera, Interaction, ProjectileKind, SimulationController, SimulationEvent, SimulationSettings,
};

const FRAME: f32 = 1.0 / 60.0;

fn run_frames(sim: &mut SimulationController, frames: usize) {
    for _ in 0..frames {
        sim.advance(FRAME);
    }
}

fn report(sim: &mut SimulationController, phase: &str) {
    let events = sim.drain_events();
    println!("== {} ({} events)", phase, events.len());
    let mut gusts = 0;
    for event in events {
        match event {
            SimulationEvent::WindGust { .. } => gusts += 1,
            other => println!("   {:?}", other),
        }
    }
    if gusts > 0 {
        println!("   {} wind gusts", gusts);
    }
    println!(
        "   bodies={} constraints={} projectiles={} stuck={} pins={} context={}",
        sim.world().body_count(),
        sim.world().constraint_count(),
        sim.projectile_count(),
        sim.stuck_projectile_count(),
        sim.pin_count(),
        sim.context()
    );
}

fn main() {
    let settings = match std::env::args().nth(1) {
        Some(path) => {
            let json = std::fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {}", path, e));
            SimulationSettings::from_json(&json).unwrap_or_else(|e| panic!("bad settings in {}: {}", path, e))
        }
        None => SimulationSettings::default(),
    };

    let mut sim = SimulationController::new(settings);
    if let Err(e) = sim.load_dummy(&BendyRagdoll::humanoid()) {
        eprintln!("could not build the dummy: {}", e);
        return;
    }
    sim.change_world_gravity(-9.81);
    sim.set_camera(Camera::new(Point3::new(0.0, 1.2, 3.0), Point3::new(0.0, 1.0, 0.0)));
    run_frames(&mut sim, 60);
    report(&mut sim, "settle");

    let torso = sim
        .dummy()
        .and_then(|d| d.body_position(sim.world(), "upperBody"))
        .unwrap_or_else(Vector3::zeros);
    sim.toggle(Interaction::Pin);
    sim.handle_pin(torso + Vector3::new(0.0, 0.1, 0.0));
    sim.toggle(Interaction::Punch);
    sim.handle_punch_dummy(torso);
    run_frames(&mut sim, 30);
    report(&mut sim, "pin and punch");

    sim.toggle(Interaction::Projectile);
    for kind in [ProjectileKind::Spear, ProjectileKind::Grenade, ProjectileKind::Banana] {
        sim.update_throw_projectile_settings(kind, 1.0, 8.0);
        let direction = Vector3::new(0.0, 1.0, 0.0) - sim.camera().position.coords;
        sim.handle_throw_projectile(direction);
        run_frames(&mut sim, 40);
    }
    report(&mut sim, "projectiles");

    sim.toggle(Interaction::Press);
    for step in 0..=10 {
        sim.move_press(step as f32 / 10.0);
        run_frames(&mut sim, 3);
    }
    report(&mut sim, "press");

    sim.toggle(Interaction::DrawAndQuarter);
    sim.move_draw_and_quarter(45.0, 1.0);
    run_frames(&mut sim, 30);
    report(&mut sim, "draw and quarter");

    sim.toggle(Interaction::FusRoDah);
    run_frames(&mut sim, 90);
    report(&mut sim, "fus ro dah");

    sim.handle_reload_scene();
    report(&mut sim, "reload");
}
