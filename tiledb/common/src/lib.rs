pub mod array;
pub mod datatype;
pub mod range;

mod private {
    // The "sealed trait" pattern is a way to prevent downstream crates from
    // implementing traits that you don't think they should implement. If you
    // have `trait Foo: Sealed`, then downstream crates cannot `impl Foo`
    // because they cannot `impl Sealed`.
    //
    // Semantic versioning is one reason you might want this.
    // We currently use this as a bound for `datatype::PhysicalType` and
    // `datatype::LogicalType` so that range and split arithmetic is only
    // instantiated for types with a known bit layout.
    pub trait Sealed {}

    macro_rules! sealed {
        ($($DT:ty),+) => {
            $(
                impl crate::private::Sealed for $DT {}
            )+
        }
    }

    pub(crate) use sealed;
}
