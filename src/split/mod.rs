pub mod split_nurbs_curve;

/// Split the object into two objects with the given option
pub trait Split
where
    Self: Sized,
{
    type Option;
    fn try_split(&self, option: Self::Option) -> anyhow::Result<(Self, Self)>;
}
