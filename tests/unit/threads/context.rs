use super::*;

fn contexts(n: usize) -> Vec<DrawerThread> {
    (0..n).map(|core| DrawerThread::new(core, n)).collect()
}

#[test]
fn every_line_has_exactly_one_owner() {
    for n in [1usize, 2, 3, 4, 7, 8] {
        let threads = contexts(n);
        for line in 0..200 {
            let owners = threads
                .iter()
                .filter(|t| !t.line_skipped_by_thread(line))
                .count();
            assert_eq!(owners, 1, "line {line} with {n} cores");
        }
    }
}

#[test]
fn count_and_skip_agree_with_owned_lines() {
    for n in [1usize, 2, 3, 4, 8] {
        for t in contexts(n) {
            for first in 0..20 {
                for count in 0..40 {
                    let owned: Vec<i32> = t.owned_lines(first, first + count).collect();
                    assert_eq!(
                        t.count_for_thread(first, count) as usize,
                        owned.len(),
                        "core {} of {n}, first {first}, count {count}",
                        t.core()
                    );
                    if let Some(&head) = owned.first() {
                        assert_eq!(first + t.skipped_by_thread(first), head);
                    }
                    for line in owned {
                        assert!(!t.line_skipped_by_thread(line));
                    }
                }
            }
        }
    }
}

#[test]
fn pass_range_clips_ownership() {
    let mut t = DrawerThread::new(1, 4);
    t.set_pass(10, 20);
    assert_eq!(t.pass_start_y(), 10);
    assert_eq!(t.pass_end_y(), 20);

    let owned: Vec<i32> = t.owned_lines(0, 100).collect();
    assert_eq!(owned, vec![13, 17]);
    assert_eq!(t.count_for_thread(0, 100), 2);
    assert_eq!(t.skipped_by_thread(0), 13);
    assert!(t.line_skipped_by_thread(9));
    assert!(t.line_skipped_by_thread(21));
}

#[test]
fn dest_for_thread_advances_by_pitch() {
    let t = DrawerThread::new(2, 4);
    // First owned line at or after 5 is 6.
    assert_eq!(t.dest_for_thread(5, 320, 1000), 1000 + 320);
}

#[test]
fn scratch_grows_and_is_reused() {
    let mut t = DrawerThread::new(0, 1);
    t.scratch_u32(4).copy_from_slice(&[1, 2, 3, 4]);
    assert_eq!(&t.scratch_u32(2)[..], &[1u32, 2][..]);
    assert_eq!(t.scratch_u32(8).len(), 8);
}

#[test]
#[should_panic(expected = "out of range")]
fn core_must_be_below_num_cores() {
    let _ = DrawerThread::new(4, 4);
}

#[test]
fn extreme_first_lines_do_not_overflow() {
    for n in [1usize, 3, 4] {
        for t in contexts(n) {
            assert_eq!(t.count_for_thread(i32::MIN, 10), 0);
            assert_eq!(t.count_for_thread(i32::MIN, i32::MAX), 0);
            assert_eq!(t.count_for_thread(i32::MAX - 1, i32::MAX), 0);
            assert_eq!(t.skipped_by_thread(i32::MIN), i32::MAX);
            assert_eq!(t.owned_lines(i32::MIN, i32::MIN + 10).count(), 0);
            assert_eq!(t.owned_lines(i32::MAX - 5, i32::MAX).count(), 0);
        }
    }

    // A run from far above the screen still reaches the owned lines near the top.
    let t = DrawerThread::new(1, 4);
    let owned: Vec<i32> = t.owned_lines(i32::MIN, 10).collect();
    assert_eq!(owned, vec![1, 5, 9]);
}
