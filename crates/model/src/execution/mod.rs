pub mod rejected_row;
