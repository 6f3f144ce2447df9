#![no_main]

use bytes::Bytes;
use dispatchbuf::DispatchData;
use libfuzzer_sys::fuzz_target;

// Split the input at fuzzer-chosen points, join the pieces and check
// every view against the flat input.
fuzz_target!(|input: (Vec<u8>, Vec<u16>, u16, u16)| {
    let (bytes, cuts, start, end) = input;

    let mut points: Vec<usize> = cuts
        .into_iter()
        .map(|cut| cut as usize % (bytes.len() + 1))
        .collect();
    points.sort_unstable();

    let mut data = DispatchData::new();
    let mut last = 0;
    for point in points.into_iter().chain(Some(bytes.len())) {
        data += DispatchData::from(Bytes::copy_from_slice(&bytes[last..point]));
        last = point;
    }

    assert_eq!(data.len(), bytes.len());
    assert_eq!(data.to_vec(), bytes);
    assert!(data.regions().all(|region| !region.is_empty()));

    let start = start as usize;
    let end = end as usize;
    let slice = data.slice(start..end);
    let expected = if start < end && start < bytes.len() {
        &bytes[start..end.min(bytes.len())]
    } else {
        &[][..]
    };
    assert_eq!(slice.to_vec(), expected);

    if let Some((region, range)) = data.region(start) {
        assert_eq!(region.to_vec(), &bytes[range]);
    } else {
        assert!(start >= bytes.len());
    }
});
