use super::*;
use crate::draw::surface::rgb;

const W: u32 = 16;
const H: u32 = 16;

fn surface() -> Arc<Surface> {
    Arc::new(Surface::new(W, H).unwrap())
}

/// Run the command built by `make` as every core of `n` on separate surfaces and check that the
/// cores write disjoint pixels whose union equals the single-core result.
fn assert_partitioned(make: impl Fn(Arc<Surface>) -> Box<dyn DrawCommand>) -> Vec<u32> {
    let reference = surface();
    make(reference.clone()).execute(&mut DrawerThread::new(0, 1));
    let expected = reference.snapshot();

    for n in [2usize, 3, 4, 8] {
        let mut union = vec![0u32; (W * H) as usize];
        for core in 0..n {
            let s = surface();
            make(s.clone()).execute(&mut DrawerThread::new(core, n));
            for (i, &px) in s.snapshot().iter().enumerate() {
                if px != 0 {
                    assert_eq!(union[i], 0, "pixel {i} written twice with {n} cores");
                    assert_eq!(i as u32 / W % n as u32, core as u32, "pixel {i} not owned");
                    union[i] = px;
                }
            }
        }
        assert_eq!(union, expected, "{n} cores");
    }
    expected
}

fn covered(pixels: &[u32]) -> usize {
    pixels.iter().filter(|&&p| p != 0).count()
}

#[test]
fn fill_column_covers_the_run() {
    let out = assert_partitioned(|dest| {
        Box::new(FillColumn {
            dest,
            x: 3,
            y: 2,
            count: 9,
            color: rgb(255, 0, 0),
        })
    });
    assert_eq!(covered(&out), 9);
    for y in 2..11 {
        assert_eq!(out[(y * W + 3) as usize], rgb(255, 0, 0));
    }
}

#[test]
fn fill_column_clips_at_the_bottom() {
    let out = assert_partitioned(|dest| {
        Box::new(FillColumn {
            dest,
            x: 0,
            y: 12,
            count: 100,
            color: 1,
        })
    });
    assert_eq!(covered(&out), 4);
}

#[test]
fn fill_span_belongs_to_one_worker() {
    let out = assert_partitioned(|dest| {
        Box::new(FillSpan {
            dest,
            y: 5,
            x1: 2,
            x2: 12,
            color: 7,
        })
    });
    assert_eq!(covered(&out), 10);
}

#[test]
fn fill_rect_clips_to_surface() {
    let out = assert_partitioned(|dest| {
        Box::new(FillRect {
            dest,
            x0: -4,
            y0: -4,
            x1: 4,
            y1: 4,
            color: 3,
        })
    });
    assert_eq!(covered(&out), 16);
}

#[test]
fn triangle_covers_pixel_centers() {
    let out = assert_partitioned(|dest| {
        Box::new(FillTriangle {
            dest,
            vertices: [Point::new(0.0, 0.0), Point::new(8.0, 0.0), Point::new(0.0, 8.0)],
            color: 5,
        })
    });
    // Row y covers the pixels whose centers satisfy x + 0.5 < 7.5 - y.
    assert_eq!(covered(&out), 28);
    assert_eq!(out[0], 5);
    assert_eq!(out[7], 0);
    assert_eq!(out[(6 * W) as usize], 5);
    assert_eq!(out[(7 * W) as usize], 0);
}

#[test]
fn triangle_winding_does_not_matter() {
    let a = assert_partitioned(|dest| {
        Box::new(FillTriangle {
            dest,
            vertices: [Point::new(1.0, 1.0), Point::new(14.0, 5.0), Point::new(6.0, 15.0)],
            color: 9,
        })
    });
    let b = assert_partitioned(|dest| {
        Box::new(FillTriangle {
            dest,
            vertices: [Point::new(6.0, 15.0), Point::new(14.0, 5.0), Point::new(1.0, 1.0)],
            color: 9,
        })
    });
    assert_eq!(a, b);
    assert!(covered(&a) > 50);
}

#[test]
fn degenerate_triangles_draw_nothing() {
    let out = assert_partitioned(|dest| {
        Box::new(FillTriangle {
            dest,
            vertices: [Point::new(0.0, 4.0), Point::new(8.0, 4.0), Point::new(16.0, 4.0)],
            color: 9,
        })
    });
    assert_eq!(covered(&out), 0);

    let out = assert_partitioned(|dest| {
        Box::new(FillTriangle {
            dest,
            vertices: [Point::new(f64::NAN, 0.0), Point::new(8.0, 4.0), Point::new(0.0, 9.0)],
            color: 9,
        })
    });
    assert_eq!(covered(&out), 0);
}

#[test]
fn copy_rows_copies_every_row_once() {
    let src = surface();
    for y in 0..H as i32 {
        src.fill_span(y, 0, W as i32, 100 + y as u32);
    }
    let out = assert_partitioned(|dest| Box::new(CopyRows::new(src.clone(), dest).unwrap()));
    assert_eq!(out, src.snapshot());
}

#[test]
fn copy_rows_rejects_size_mismatch() {
    let a = Arc::new(Surface::new(4, 4).unwrap());
    let b = Arc::new(Surface::new(4, 5).unwrap());
    assert!(CopyRows::new(a, b).is_err());
}

#[test]
fn pass_range_limits_commands() {
    let s = surface();
    let mut t = DrawerThread::new(0, 1);
    t.set_pass(4, 8);
    FillRect {
        dest: s.clone(),
        x0: 0,
        y0: 0,
        x1: W as i32,
        y1: H as i32,
        color: 1,
    }
    .execute(&mut t);
    assert_eq!(covered(&s.snapshot()), 4 * W as usize);
    assert_eq!(s.get(0, 3), Some(0));
    assert_eq!(s.get(0, 4), Some(1));
}

#[test]
fn far_off_screen_column_draws_nothing() {
    let out = assert_partitioned(|dest| {
        Box::new(FillColumn {
            dest,
            x: 1,
            y: i32::MIN,
            count: 10,
            color: 4,
        })
    });
    assert_eq!(covered(&out), 0);

    let out = assert_partitioned(|dest| {
        Box::new(FillColumn {
            dest,
            x: 1,
            y: i32::MAX - 3,
            count: i32::MAX,
            color: 4,
        })
    });
    assert_eq!(covered(&out), 0);
}
