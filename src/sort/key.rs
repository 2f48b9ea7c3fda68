//! Sort keys
//!
//! A `SortKey` holds one encoded segment per ordering column (plus a trailing
//! ordinal under `DuplicatePolicy::Preserve`) and the canonical payload of the
//! full row. The ordinal shares the direction of the last ordering column so
//! it never starts a new direction group.

use crate::codec::key::encode_segment;
use crate::codec::row::{decode_row, encode_row};
use crate::codec::{Collation, GrowableBuffer};
use crate::config::EngineConfig;
use crate::context::QueryContext;
use crate::executor::{ExecutionError, ExecutionResult};
use crate::types::{OrderingSpec, Row, Value};

use super::policy::DuplicatePolicy;

/// Per-record framing overhead: one length word per segment, the segment
/// count and the value length
const FRAME_WORD: usize = 4;

/// Encoded sort key and row payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    segments: Vec<Vec<u8>>,
    value: Vec<u8>,
}

impl SortKey {
    pub fn new(segments: Vec<Vec<u8>>, value: Vec<u8>) -> Self {
        Self { segments, value }
    }

    /// Encoded key segments
    pub fn segments(&self) -> &[Vec<u8>] {
        &self.segments
    }

    /// Canonical row payload
    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// All segments concatenated, usable as an ordered-store key
    pub fn key_bytes(&self) -> Vec<u8> {
        self.segments.concat()
    }

    /// Bytes this key occupies in a spill run
    pub fn framed_size(&self) -> usize {
        let segments: usize = self.segments.iter().map(|s| s.len() + FRAME_WORD).sum();
        segments + FRAME_WORD + self.value.len() + FRAME_WORD
    }

    /// Rebuild the row from the payload
    pub fn to_row(&self) -> ExecutionResult<Row> {
        decode_row(&self.value)
            .map_err(|e| ExecutionError::data_corruption(format!("sort payload: {}", e)))
    }

    pub fn into_parts(self) -> (Vec<Vec<u8>>, Vec<u8>) {
        (self.segments, self.value)
    }
}

/// Builds sort keys for rows under one ordering
#[derive(Debug)]
pub struct SortKeyBuilder {
    ordering: OrderingSpec,
    policy: DuplicatePolicy,
    key_buffer: GrowableBuffer,
    value_buffer: GrowableBuffer,
    directions: Vec<bool>,
    ordinal: i64,
}

impl SortKeyBuilder {
    pub fn new(ordering: OrderingSpec, policy: DuplicatePolicy, config: &EngineConfig) -> Self {
        let mut directions = ordering.directions();
        if policy.appends_ordinal() {
            let last = directions.last().copied().unwrap_or(true);
            directions.push(last);
        }
        Self {
            ordering,
            policy,
            key_buffer: GrowableBuffer::new(
                "sort key",
                config.initial_key_bytes,
                config.max_key_bytes,
            ),
            value_buffer: GrowableBuffer::new(
                "sort row",
                config.initial_value_bytes,
                config.max_value_bytes,
            ),
            directions,
            ordinal: 0,
        }
    }

    /// Direction of every key segment, ordinal included
    pub fn directions(&self) -> &[bool] {
        &self.directions
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    pub fn ordering(&self) -> &OrderingSpec {
        &self.ordering
    }

    /// Evaluate the ordering against `row` and encode key and payload
    pub fn build(&mut self, row: &Row, context: &QueryContext) -> ExecutionResult<SortKey> {
        let mut values: Vec<(Value, Collation)> = Vec::with_capacity(self.directions.len());
        for column in self.ordering.columns() {
            let expression = column.expression();
            let value = expression.evaluate(row, context.bindings(), context)?;
            values.push((value, expression.collation()));
        }
        if self.policy.appends_ordinal() {
            values.push((Value::Int(self.ordinal), Collation::Binary));
        }

        let mut ends = Vec::with_capacity(values.len());
        let key = self.key_buffer.encode(|w| {
            ends.clear();
            for (value, collation) in &values {
                encode_segment(value, *collation, w)?;
                ends.push(w.len());
            }
            Ok(())
        })?;
        let value = self.value_buffer.encode(|w| encode_row(row.values(), w))?;

        let mut segments = Vec::with_capacity(ends.len());
        let mut start = 0;
        for end in ends {
            segments.push(key[start..end].to_vec());
            start = end;
        }
        self.ordinal += 1;
        Ok(SortKey::new(segments, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::key::segment_to_vec;
    use crate::row;
    use crate::types::{ColumnRef, OrderingColumn};
    use std::sync::Arc;

    #[test]
    fn test_segments_and_payload() {
        let ordering = OrderingSpec::by_fields(&[true, false]).unwrap();
        let mut builder =
            SortKeyBuilder::new(ordering, DuplicatePolicy::Default, &EngineConfig::default());
        let key = builder.build(&row![3, "x", 9], &QueryContext::default()).unwrap();
        assert_eq!(key.segments().len(), 2);
        assert_eq!(key.segments()[0], segment_to_vec(&Value::Int(3), Collation::Binary));
        assert_eq!(key.to_row().unwrap(), row![3, "x", 9]);
        assert_eq!(builder.directions(), &[true, false]);
    }

    #[test]
    fn test_ordinal_follows_last_direction() {
        let ordering = OrderingSpec::by_fields(&[true, false]).unwrap();
        let mut builder =
            SortKeyBuilder::new(ordering, DuplicatePolicy::Preserve, &EngineConfig::default());
        assert_eq!(builder.directions(), &[true, false, false]);
        let ctx = QueryContext::default();
        let first = builder.build(&row![1, 1], &ctx).unwrap();
        let second = builder.build(&row![1, 1], &ctx).unwrap();
        assert_eq!(first.segments().len(), 3);
        assert_eq!(first.segments()[..2], second.segments()[..2]);
        assert!(first.segments()[2] < second.segments()[2]);
    }

    #[test]
    fn test_collated_key() {
        let ordering = OrderingSpec::new(vec![OrderingColumn::new(
            Arc::new(ColumnRef::collated(0, Collation::CaseInsensitive)),
            true,
        )])
        .unwrap();
        let mut builder =
            SortKeyBuilder::new(ordering, DuplicatePolicy::Default, &EngineConfig::default());
        let ctx = QueryContext::default();
        let a = builder.build(&row!["ABC"], &ctx).unwrap();
        let b = builder.build(&row!["abc"], &ctx).unwrap();
        assert_eq!(a.segments(), b.segments());
        assert_ne!(a.value(), b.value());
    }

    #[test]
    fn test_key_size_limit() {
        let config = EngineConfig {
            initial_key_bytes: 8,
            max_key_bytes: 32,
            ..EngineConfig::default()
        };
        let ordering = OrderingSpec::by_fields(&[true]).unwrap();
        let mut builder = SortKeyBuilder::new(ordering, DuplicatePolicy::Default, &config);
        let ctx = QueryContext::default();
        assert!(builder.build(&row!["short"], &ctx).is_ok());
        let err = builder.build(&row!["x".repeat(100)], &ctx).unwrap_err();
        assert_eq!(err.code().code(), "AERO_KEY_SIZE_EXCEEDED");
    }

    #[test]
    fn test_framed_size() {
        let key = SortKey::new(vec![vec![1, 2], vec![3]], vec![9; 5]);
        assert_eq!(key.framed_size(), (2 + 4) + (1 + 4) + 4 + 5 + 4);
    }
}
