#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeIndex(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PolyIndex(pub u32);

macro_rules! impl_index_conversions {
    ($($name:ident),*) => {
        $(
            impl $name {
                #[inline]
                pub fn index(self) -> usize {
                    self.0 as usize
                }
            }

            impl From<u32> for $name {
                fn from(v: u32) -> Self {
                    Self(v)
                }
            }

            impl From<$name> for u32 {
                fn from(v: $name) -> Self {
                    v.0
                }
            }

            impl From<usize> for $name {
                fn from(v: usize) -> Self {
                    Self(v as u32)
                }
            }

            impl From<$name> for usize {
                fn from(v: $name) -> Self {
                    v.0 as usize
                }
            }
        )*
    };
}

impl_index_conversions!(EdgeIndex, PolyIndex);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_conversions() {
        let e = EdgeIndex::from(7usize);
        assert_eq!(e.index(), 7);
        assert_eq!(u32::from(e), 7);
        assert_eq!(usize::from(PolyIndex(3)), 3);
        assert!(PolyIndex(1) < PolyIndex(2));
    }
}
