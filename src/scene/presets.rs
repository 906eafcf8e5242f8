//! Procedural scene presets.

use std::f32::consts::FRAC_PI_2;

use crate::geom::{Geometry, TriangleMesh};
use crate::util::{Affine3A, Error, Result, Vec2, Vec3};

use super::{Camera, Scene};

/// Preset names with one-line descriptions, in listing order.
pub const PRESETS: &[(&str, &str)] = &[
    ("two-triangles", "Two triangles at z=-5 and z=-10 in front of the camera"),
    ("cornell", "Open box of quads with a cube and two spheres"),
    ("grid", "16x16 grid of spheres and cubes on a floor (BVH stress)"),
];

/// Build the preset called `name` for a `width` x `height` viewport.
pub fn preset(name: &str, width: u32, height: u32) -> Result<Scene> {
    let scene = match name {
        "two-triangles" => two_triangles(width, height),
        "cornell" => cornell(width, height),
        "grid" => grid(16, width, height),
        _ => return Err(Error::UnknownScene(name.to_string())),
    };
    log::info!(
        "Scene '{}': {} primitives, {} meshes",
        scene.name,
        scene.geometry.len(),
        scene.geometry.meshes.len()
    );
    Ok(scene)
}

fn single_triangle(z: f32) -> TriangleMesh {
    TriangleMesh::new(
        vec![Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
        Vec::new(),
        Vec::new(),
        vec![[0, 1, 2]],
        Affine3A::from_translation(Vec3::new(0.0, 0.0, z)),
    )
}

pub fn two_triangles(width: u32, height: u32) -> Scene {
    let mut geometry = Geometry::new();
    geometry.add_mesh(single_triangle(-5.0));
    geometry.add_mesh(single_triangle(-10.0));
    Scene::new("two-triangles", geometry, Camera::new(width, height))
}

pub fn cornell(width: u32, height: u32) -> Scene {
    let mut g = Geometry::new();
    let wall = Vec2::splat(4.0);

    // Floor, ceiling, back, left, right. Quads face +Z before rotation.
    let walls = [
        Affine3A::from_translation(Vec3::new(0.0, 0.0, 0.0)) * Affine3A::from_rotation_x(-FRAC_PI_2),
        Affine3A::from_translation(Vec3::new(0.0, 4.0, 0.0)) * Affine3A::from_rotation_x(FRAC_PI_2),
        Affine3A::from_translation(Vec3::new(0.0, 2.0, -2.0)),
        Affine3A::from_translation(Vec3::new(-2.0, 2.0, 0.0)) * Affine3A::from_rotation_y(FRAC_PI_2),
        Affine3A::from_translation(Vec3::new(2.0, 2.0, 0.0)) * Affine3A::from_rotation_y(-FRAC_PI_2),
    ];
    for xf in walls {
        g.add_mesh(TriangleMesh::quad(wall, xf));
    }

    g.add_mesh(TriangleMesh::cube(Affine3A::from_scale_rotation_translation(
        Vec3::splat(1.2),
        glam::Quat::from_rotation_y(20f32.to_radians()),
        Vec3::new(-0.7, 0.6, -0.6),
    )));
    g.add_sphere(Vec3::new(0.8, 0.5, 0.3), 0.5);
    g.add_sphere(Vec3::new(0.3, 2.2, -1.0), 0.6);

    let camera = Camera::new(width, height).looking(Vec3::new(0.0, 2.0, 7.0), -90.0, 0.0);
    Scene::new("cornell", g, camera)
}

/// `n` x `n` alternating spheres and cubes, spacing 2, on a floor quad.
pub fn grid(n: u32, width: u32, height: u32) -> Scene {
    let mut g = Geometry::new();
    let extent = n as f32 * 2.0;
    g.add_mesh(TriangleMesh::quad(
        Vec2::splat(extent + 4.0),
        Affine3A::from_rotation_x(-FRAC_PI_2),
    ));

    let origin = -(n as f32 - 1.0);
    for i in 0..n {
        for j in 0..n {
            let p = Vec3::new(origin + i as f32 * 2.0, 0.5, origin + j as f32 * 2.0);
            if (i + j) % 2 == 0 {
                g.add_sphere(p, 0.5);
            } else {
                g.add_mesh(TriangleMesh::cube(Affine3A::from_translation(p)));
            }
        }
    }

    let camera = Camera::new(width, height).looking(Vec3::new(0.0, extent * 0.6, extent * 1.1), -90.0, -30.0);
    Scene::new("grid", g, camera)
}
