//! Host/kernel agreement: bindings, layouts and dispatch sizing.

use star::accel::{build_bvh, BuildOptions};
use star::gpu::{
    div_up, ArgKind, DispatchGrid, GpuScene, KernelArg, FRAME_FLAG_NORMALS, KERNEL_ENTRY, QUAD_WGSL, TRACE_WGSL,
    WORKGROUP_SIZE,
};
use star::geom::PrimitiveKind;
use star::render::ShadingMode;
use star::scene::presets;

/// `@binding(N) var<...> name` declarations in a WGSL source.
fn bindings(source: &str) -> Vec<(u32, String, String)> {
    source
        .lines()
        .filter_map(|line| {
            let rest = line.trim().split("@binding(").nth(1)?;
            let (num, rest) = rest.split_once(')')?;
            let rest = rest.trim().strip_prefix("var")?;
            let (qualifier, rest) = match rest.strip_prefix('<') {
                Some(r) => {
                    let (q, r) = r.split_once('>')?;
                    (q.to_string(), r)
                }
                None => (String::new(), rest),
            };
            let name = rest.trim().split(':').next()?.trim().to_string();
            Some((num.parse().ok()?, name, qualifier))
        })
        .collect()
}

#[test]
fn test_trace_kernel_bindings_match_args() {
    let decls = bindings(TRACE_WGSL);
    assert_eq!(decls.len(), KernelArg::ALL.len(), "{decls:?}");

    for arg in KernelArg::ALL {
        let (_, name, qualifier) = decls
            .iter()
            .find(|(n, _, _)| *n == arg.binding())
            .unwrap_or_else(|| panic!("no binding for {arg}"));
        assert_eq!(name, arg.name(), "binding {}", arg.binding());
        match arg.kind() {
            ArgKind::StorageBuffer => assert_eq!(qualifier, "storage, read", "{arg}"),
            ArgKind::UniformBuffer | ArgKind::Scalars => assert_eq!(qualifier, "uniform", "{arg}"),
            ArgKind::Image => assert!(qualifier.is_empty(), "{arg}"),
        }
    }
}

#[test]
fn test_kernel_entry_and_workgroup() {
    assert!(TRACE_WGSL.contains(&format!("fn {KERNEL_ENTRY}(")));
    let wg = format!("@workgroup_size({}, {})", WORKGROUP_SIZE[0], WORKGROUP_SIZE[1]);
    assert!(TRACE_WGSL.contains(&wg), "kernel must declare {wg}");
    assert!(QUAD_WGSL.contains("fn vs_main("));
    assert!(QUAD_WGSL.contains("fn fs_main("));
}

#[test]
fn test_dispatch_covers_image() {
    for (w, h) in [(1, 1), (16, 16), (17, 1), (800, 600), (1000, 700), (1921, 1081)] {
        let grid = DispatchGrid::new(w, h);
        let [gx, gy] = grid.global();
        assert!(gx >= w && gy >= h);
        assert!(gx - w < WORKGROUP_SIZE[0] && gy - h < WORKGROUP_SIZE[1]);
        assert_eq!(grid.workgroups(), [div_up(w, WORKGROUP_SIZE[0]), div_up(h, WORKGROUP_SIZE[1])]);
    }
    assert!(DispatchGrid::new(0, 10).is_empty());
}

#[test]
fn test_gpu_scene_follows_leaf_order() {
    let scene = presets::cornell(64, 64);
    let bvh = build_bvh(&scene.geometry, BuildOptions::default());
    let gpu = GpuScene::new(&scene.geometry, &bvh).expect("gpu scene");

    assert_eq!(gpu.node_count() as usize, bvh.nodes().len());
    assert_eq!(gpu.primitive_count() as usize, scene.geometry.len());
    assert_eq!(gpu.nodes_bytes().len(), bvh.nodes().len() * 32);
    assert_eq!(gpu.primitives_bytes().len(), scene.geometry.len() * 96);

    for (slot, &index) in bvh.primitive_indices().iter().enumerate() {
        let expected = scene.geometry.primitives[index as usize].kind();
        assert_eq!(gpu.primitives[slot].kind(), Some(expected), "slot {slot}");
    }
    let spheres = gpu.primitives.iter().filter(|p| p.kind() == Some(PrimitiveKind::Sphere)).count();
    assert_eq!(spheres, 2);

    for (node, gpu_node) in bvh.nodes().iter().zip(&gpu.nodes) {
        assert_eq!(gpu_node.primitive_count() as u32, node.primitive_count);
        assert_eq!(gpu_node.offset, node.offset);
        assert_eq!(gpu_node.axis(), node.axis);
    }
}

#[test]
fn test_shading_flags() {
    assert_eq!(ShadingMode::Lambert.flags(), 0);
    assert_eq!(ShadingMode::Normals.flags(), FRAME_FLAG_NORMALS);
    assert!(TRACE_WGSL.contains("params.flags | camera.flags"));
}
