//! BVH construction and traversal checked against brute force.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use star::accel::{build_bvh, BuildOptions, Bvh, SplitMethod};
use star::geom::{BBox, Geometry, Intersection, Ray, TriangleMesh};
use star::scene::presets;
use star::util::{approx_eq, Affine3A, Vec3};

const SPLITS: [SplitMethod; 3] = [SplitMethod::Middle, SplitMethod::EqualCounts, SplitMethod::Sah];

fn options(split: SplitMethod, max_leaf_size: usize) -> BuildOptions {
    BuildOptions { split, max_leaf_size, ..Default::default() }
}

/// Structural invariants of a flattened tree.
fn check_flat_layout(bvh: &Bvh, primitive_count: usize) {
    let nodes = bvh.nodes();
    if primitive_count == 0 {
        assert!(nodes.is_empty());
        return;
    }

    let mut seen = vec![0u32; primitive_count];
    for (i, node) in nodes.iter().enumerate() {
        if node.is_leaf() {
            for slot in node.primitive_range() {
                let prim = bvh.primitive_indices()[slot] as usize;
                seen[prim] += 1;
            }
        } else {
            let first = i + 1;
            let second = node.second_child() as usize;
            assert!(first < nodes.len(), "node {i}: first child out of range");
            assert!(second > first && second < nodes.len(), "node {i}: second child {second}");
            assert!(node.bound.contains(&nodes[first].bound), "node {i} does not contain first child");
            assert!(node.bound.contains(&nodes[second].bound), "node {i} does not contain second child");
        }
    }
    assert!(seen.iter().all(|&n| n == 1), "every primitive in exactly one leaf");
    assert_eq!(bvh.primitive_indices().len(), primitive_count);
}

fn random_scene(rng: &mut StdRng, spheres: usize, triangles: usize) -> Geometry {
    let mut g = Geometry::new();
    for _ in 0..spheres {
        let c = Vec3::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0));
        g.add_sphere(c, rng.gen_range(0.1..1.0));
    }
    let mut positions = Vec::new();
    let mut indices = Vec::new();
    for t in 0..triangles as u32 {
        let base = Vec3::new(rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0), rng.gen_range(-10.0..10.0));
        for _ in 0..3 {
            positions.push(base + Vec3::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)));
        }
        indices.push([t * 3, t * 3 + 1, t * 3 + 2]);
    }
    if !indices.is_empty() {
        g.add_mesh(TriangleMesh::new(positions, Vec::new(), Vec::new(), indices, Affine3A::IDENTITY));
    }
    g
}

fn random_ray(rng: &mut StdRng) -> Ray {
    let origin = Vec3::new(rng.gen_range(-15.0..15.0), rng.gen_range(-15.0..15.0), rng.gen_range(-15.0..15.0));
    let target = Vec3::new(rng.gen_range(-8.0..8.0), rng.gen_range(-8.0..8.0), rng.gen_range(-8.0..8.0));
    Ray::new(origin, (target - origin).normalize())
}

#[test]
fn test_two_triangles_nearest_hit() {
    let scene = presets::two_triangles(64, 64);
    let bvh = build_bvh(&scene.geometry, BuildOptions::default());

    let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
    let hit = bvh.intersect(&scene.geometry, &ray).expect("ray hits the near triangle");
    assert_eq!(hit.primitive, 0);
    assert!((hit.distance - 5.0).abs() < 1e-4);
    assert!((hit.position - Vec3::new(0.0, 0.0, -5.0)).length() < 1e-4);
    assert!(bvh.intersect_p(&scene.geometry, &ray));

    // Range stops short of both triangles.
    let short = Ray::with_range(Vec3::ZERO, Vec3::NEG_Z, 0.0, 3.0);
    assert!(bvh.intersect(&scene.geometry, &short).is_none());
    assert!(!bvh.intersect_p(&scene.geometry, &short));

    // Starting past the first triangle finds the second.
    let far = Ray::with_range(Vec3::ZERO, Vec3::NEG_Z, 6.0, f32::INFINITY);
    let hit = bvh.intersect(&scene.geometry, &far).expect("second triangle");
    assert_eq!(hit.primitive, 1);
    assert!((hit.distance - 10.0).abs() < 1e-4);

    // Pointing away misses.
    assert!(bvh.intersect(&scene.geometry, &Ray::new(Vec3::ZERO, Vec3::Z)).is_none());
}

#[test]
fn test_flat_layout_all_splits() {
    let mut rng = StdRng::seed_from_u64(7);
    let g = random_scene(&mut rng, 150, 150);
    for split in SPLITS {
        for leaf in [1, 4, 8] {
            let bvh = build_bvh(&g, options(split, leaf));
            check_flat_layout(&bvh, g.len());
            let stats = bvh.stats();
            assert!(stats.max_leaf_size >= 1);
            assert_eq!(stats.primitive_count, g.len());
            assert_eq!(stats.node_count, 2 * stats.leaf_count - 1, "{split:?} leaf {leaf}");
        }
    }
}

#[test]
fn test_root_bound_matches_scene() {
    let scene = presets::cornell(32, 32);
    let bvh = build_bvh(&scene.geometry, BuildOptions::default());
    let scene_bound = scene.geometry.world_bound();
    let root: BBox = bvh.bound();
    assert!((root.min - scene_bound.min).length() < 1e-4);
    assert!((root.max - scene_bound.max).length() < 1e-4);
}

#[test]
fn test_random_rays_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let g = random_scene(&mut rng, 200, 300);

    for split in SPLITS {
        let bvh = build_bvh(&g, options(split, 4));
        let mut hits = 0;
        for _ in 0..2000 {
            let ray = random_ray(&mut rng);
            let expected = g.intersect_brute_force(&ray);
            let actual = bvh.intersect(&g, &ray);
            match (expected, actual) {
                (None, None) => {}
                (Some(e), Some(a)) => {
                    hits += 1;
                    assert!(
                        (e.distance - a.distance).abs() < 1e-4,
                        "{split:?}: brute {} vs bvh {} for {ray}",
                        e.distance,
                        a.distance
                    );
                }
                (e, a) => panic!("{split:?}: brute {:?} vs bvh {:?} for {ray}", e.map(|h| h.distance), a.map(|h| h.distance)),
            }
            assert_eq!(expected.is_some(), bvh.intersect_p(&g, &ray));
        }
        assert!(hits > 100, "{split:?}: only {hits} hits, scene too sparse for the test");
    }
}

#[test]
fn test_single_primitive() {
    let mut sphere = Geometry::new();
    sphere.add_sphere(Vec3::new(0.0, 0.0, -3.0), 1.0);
    let mut triangle = Geometry::new();
    triangle.add_mesh(TriangleMesh::new(
        vec![Vec3::new(-1.0, -1.0, -4.0), Vec3::new(1.5, -0.5, -3.0), Vec3::new(0.0, 1.0, -2.5)],
        Vec::new(),
        Vec::new(),
        vec![[0, 1, 2]],
        Affine3A::IDENTITY,
    ));

    let mut rng = StdRng::seed_from_u64(11);
    for g in [&sphere, &triangle] {
        let bvh = build_bvh(g, BuildOptions::default());
        assert_eq!(bvh.nodes().len(), 1);
        assert!(bvh.nodes()[0].is_leaf());
        let centre = g.world_bound().centroid();

        let mut hits = 0;
        for _ in 0..500 {
            // Aim near the primitive so hits and misses both occur.
            let origin = Vec3::new(rng.gen_range(-6.0..6.0), rng.gen_range(-6.0..6.0), rng.gen_range(-1.0..6.0));
            let target = centre + Vec3::new(rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5), rng.gen_range(-1.5..1.5));
            let ray = Ray::new(origin, (target - origin).normalize());

            let mut direct = Intersection::default();
            let direct_hit = g.primitives[0].intersect(&g.meshes, &ray, 0, &mut direct);
            let traced = bvh.intersect(g, &ray);
            assert_eq!(traced.is_some(), direct_hit, "ray {ray:?}");
            assert_eq!(bvh.intersect_p(g, &ray), direct_hit, "ray {ray:?}");
            if let Some(hit) = traced {
                hits += 1;
                assert_eq!(hit.primitive, 0);
                assert!(approx_eq(hit.distance, direct.distance, 1e-5), "{} vs {}", hit.distance, direct.distance);
            }
        }
        assert!(hits > 25 && hits < 475, "{hits} hits");
    }
}

#[test]
fn test_empty_scene() {
    let g = Geometry::new();
    let bvh = build_bvh(&g, BuildOptions::default());
    assert!(bvh.is_empty());
    assert_eq!(bvh.stats().node_count, 0);
    let ray = Ray::new(Vec3::ZERO, Vec3::NEG_Z);
    assert!(bvh.intersect(&g, &ray).is_none());
    assert!(!bvh.intersect_p(&g, &ray));
}

#[test]
fn test_coincident_centroids() {
    // Every centroid identical: the builder cannot split on position.
    let mut g = Geometry::new();
    for i in 0..20 {
        g.add_sphere(Vec3::ZERO, 0.5 + i as f32 * 0.01);
    }
    for split in SPLITS {
        let bvh = build_bvh(&g, options(split, 2));
        check_flat_layout(&bvh, g.len());
        let hit = bvh.intersect(&g, &Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z)).expect("hit");
        // Largest sphere is hit first.
        assert_eq!(hit.primitive, 19);
    }
}
