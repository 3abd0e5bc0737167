#![no_main]

use libfuzzer_sys::fuzz_target;
use ndarray::{ArrayD, IxDyn};
use quietwave_core::{FrameAdapter, ShapeError};

// data[0]: rank, data[1..1+rank]: dims, next 2 bytes: original_len.
fuzz_target!(|data: &[u8]| {
    let Some((&rank, rest)) = data.split_first() else {
        return;
    };
    let rank = (rank % 5) as usize;
    if rest.len() < rank + 2 {
        return;
    }
    let dims: Vec<usize> = rest[..rank].iter().map(|&d| (d % 8) as usize).collect();
    let original_len = u16::from_le_bytes([rest[rank], rest[rank + 1]]) as usize % 64;

    let count: usize = dims.iter().product();
    let output = ArrayD::from_shape_vec(IxDyn(&dims), (0..count).map(|i| i as f32).collect())
        .expect("shape matches element count");

    match FrameAdapter::restore(output.view(), original_len) {
        Ok(samples) => {
            assert_eq!(dims.len(), 3);
            assert_eq!((dims[0], dims[1]), (1, 1));
            assert_eq!(samples.len(), original_len);
            assert!(samples.iter().enumerate().all(|(i, &s)| s == i as f32));
        }
        Err(ShapeError::OutputTooShort { available, required }) => {
            assert_eq!(required, original_len);
            assert!(available < required);
        }
        Err(ShapeError::UnexpectedOutput { .. }) => {
            assert!(dims.len() != 3 || dims[0] != 1 || dims[1] != 1);
        }
        Err(ShapeError::NotMono { .. }) => unreachable!("restore never reports NotMono"),
    }
});
