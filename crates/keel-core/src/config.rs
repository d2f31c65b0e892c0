//! Build-time configuration constants.

/// Minimum alignment handed to any allocator; equal to the pointer size.
pub const MIN_ALIGNMENT: usize = core::mem::size_of::<*const u8>();

/// Number of buckets a hash table starts with. Always a power of two.
pub const HASH_BUCKET_INITIAL_COUNT: usize = 16;

/// Maximum live-entries / buckets ratio before a hash table doubles its
/// bucket count.
pub const HASH_BUCKET_LOAD_FACTOR: f32 = 0.75;

/// Smallest non-zero capacity a dynamic array will hold.
pub const ARRAY_MIN_CAPACITY: usize = 4;
