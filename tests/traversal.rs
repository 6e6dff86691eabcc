//! End-to-end traversal through the public facade.

use bumpalo::Bump;
use pretty_assertions::assert_eq;
use strider::iter::{MutableOps, ReadOnlyOps};
use strider::state::StateBlock;
use strider::{Capability, IterError, RawIter, array};

#[test]
fn three_words_at_four_byte_stride() {
    let values: [u32; 3] = [0xAAAA, 0xBBBB, 0xCCCC];
    let base = values.as_ptr().cast::<u8>();

    let mut iter = RawIter::new();
    array::create_read_only(&mut iter, base, 3, 4).unwrap();

    let mut view = iter.read_only().unwrap();
    let addresses: Vec<*const u8> = view.walk().collect();
    assert_eq!(
        addresses,
        [base, base.wrapping_add(4), base.wrapping_add(8)]
    );
    let read: Vec<u32> = addresses
        .iter()
        .map(|p| unsafe { p.cast::<u32>().read() })
        .collect();
    assert_eq!(read, values);
    assert_eq!(view.end(), base.wrapping_add(12));
}

#[test]
fn manual_loop_matches_walk() {
    let values = [10i64, -20, 30, -40];
    let mut iter = RawIter::new();
    array::create_from_slice(&mut iter, &values).unwrap();

    let mut view = iter.read_only().unwrap();
    let mut manual = Vec::new();
    let end = view.end();
    let mut p = view.begin();
    while p != end {
        manual.push(unsafe { p.cast::<i64>().read() });
        p = view.next();
    }
    assert_eq!(manual, values);

    let walked: Vec<i64> = view
        .walk()
        .map(|p| unsafe { p.cast::<i64>().read() })
        .collect();
    assert_eq!(walked, manual);
}

#[test]
fn same_handle_rebinds_to_another_buffer() {
    let first = [1u16, 2, 3];
    let second = [4u16, 5];
    let mut iter = RawIter::new();
    array::create_from_slice(&mut iter, &first).unwrap();
    assert_eq!(iter.read_only().unwrap().walk().count(), 3);

    array::bind_read_only_buffer(&mut iter, second.as_ptr().cast(), 2, 2).unwrap();
    let seen: Vec<u16> = iter
        .read_only()
        .unwrap()
        .walk()
        .map(|p| unsafe { p.cast::<u16>().read() })
        .collect();
    assert_eq!(seen, second);
}

#[test]
fn struct_elements_with_padding() {
    #[derive(Debug, Clone, Copy, PartialEq)]
    #[repr(C)]
    struct Sample {
        id: u8,
        value: u32,
    }

    let mut samples = [
        Sample { id: 1, value: 100 },
        Sample { id: 2, value: 200 },
    ];
    let arena = Bump::new();
    let mut iter = RawIter::new_in(&arena);
    array::create_from_mut_slice(&mut iter, &mut samples).unwrap();
    assert_eq!(
        array::descriptor(&iter).map(|d| d.stride()),
        Some(size_of::<Sample>())
    );

    for p in iter.mutable().unwrap().walk() {
        let sample = unsafe { &mut *p.cast::<Sample>() };
        sample.value += u32::from(sample.id);
    }
    drop(iter);
    assert_eq!(samples[0].value, 101);
    assert_eq!(samples[1].value, 202);
}

#[test]
fn custom_implementation_over_the_core() {
    // A step counter kept in the first state byte; addresses are offsets
    // into the state block itself.
    fn begin(state: &mut StateBlock) -> *mut u8 {
        state.as_bytes_mut()[0] = 0;
        state.as_ptr().as_ptr()
    }
    fn next(state: &mut StateBlock) -> *mut u8 {
        state.as_bytes_mut()[0] += 1;
        let step = usize::from(state.as_bytes()[0]);
        state.as_ptr().as_ptr().wrapping_add(step)
    }
    fn end(state: &mut StateBlock) -> *mut u8 {
        state.as_ptr().as_ptr().wrapping_add(state.len())
    }

    let mut iter = RawIter::with_state_size(4).unwrap();
    iter.bind_mutable(MutableOps { begin, next, end }).unwrap();
    assert_eq!(iter.mutable().unwrap().walk().count(), 4);

    // A mutable handle refuses a read-only view.
    assert!(matches!(
        iter.read_only(),
        Err(IterError::Config(_))
    ));

    // Rebinding as read-only keeps the state block.
    iter.bind_read_only(ReadOnlyOps {
        begin: |s| s.as_ptr().as_ptr().cast_const(),
        next: |s| s.as_ptr().as_ptr().cast_const(),
        end: |s| s.as_ptr().as_ptr().cast_const(),
    })
    .unwrap();
    assert_eq!(iter.capability(), Some(Capability::ReadOnly));
    assert_eq!(iter.read_only().unwrap().walk().count(), 0);
}
