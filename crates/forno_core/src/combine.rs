//! Latest-of-all stream composition
//!
//! [`CombineLatest`] merges N independent streams into one stream of
//! tuples: nothing is emitted until every input has produced at least one
//! value, and from then on each input emission produces a fresh tuple built
//! from the latest known value of every input. This is the spreadsheet
//! recomputation rule a view model wants: re-render when any dependency
//! changes, using current values of the rest.
//!
//! Implemented for tuples of `&Stream` up to arity 9.

use crate::stream::Stream;
use std::sync::{Arc, Mutex};

/// Combine a tuple of streams into a single latest-of-all stream.
pub trait CombineLatest {
    type Output;

    fn combine_latest(self) -> Stream<Self::Output>;
}

macro_rules! impl_combine_latest {
    ( $all_some:ident : $( ($T:ident, $value:ident, $idx:tt) ),+ ) => {
        fn $all_some<$( $T ),+>(
            slots: ( $( Option<$T>, )+ ),
        ) -> Option<( $( $T, )+ )> {
            match slots {
                ( $( Some($value), )+ ) => Some(( $( $value, )+ )),
                _ => None,
            }
        }

        impl<'a, $( $T, )+> CombineLatest for ( $( &'a Stream<$T>, )+ )
        where
            $( $T: Clone + Send + Sync + 'static, )+
        {
            type Output = ( $( $T, )+ );

            fn combine_latest(self) -> Stream<Self::Output> {
                let combined: Stream<Self::Output> = Stream::idle();
                let slots = Arc::new(Mutex::new(( $( Option::<$T>::None, )+ )));
                $(
                    {
                        let weak = combined.downgrade();
                        let slots = Arc::clone(&slots);
                        let sub = self.$idx.subscribe(move |value: &$T| {
                            let ready = {
                                let mut guard = slots.lock().unwrap();
                                guard.$idx = Some(value.clone());
                                $all_some((*guard).clone())
                            };
                            if let (Some(core), Some(output)) = (weak.upgrade(), ready) {
                                core.emit(output);
                            }
                        });
                        combined.attach_upstream(sub);
                    }
                )+
                combined
            }
        }
    };
}

impl_combine_latest!(all_some2: (A, a, 0), (B, b, 1));
impl_combine_latest!(all_some3: (A, a, 0), (B, b, 1), (C, c, 2));
impl_combine_latest!(all_some4: (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3));
impl_combine_latest!(all_some5: (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4));
impl_combine_latest!(all_some6: (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4), (F, f, 5));
impl_combine_latest!(all_some7: (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4), (F, f, 5), (G, g, 6));
impl_combine_latest!(all_some8: (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4), (F, f, 5), (G, g, 6), (H, h, 7));
impl_combine_latest!(all_some9: (A, a, 0), (B, b, 1), (C, c, 2), (D, d, 3), (E, e, 4), (F, f, 5), (G, g, 6), (H, h, 7), (I, i, 8));
