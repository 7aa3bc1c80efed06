pub(crate) mod inspect;
pub(crate) mod status;
pub(crate) mod sweep;
