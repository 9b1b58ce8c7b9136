mod drafts;
mod export;
mod lifecycle;
mod pagination;
mod validation;
