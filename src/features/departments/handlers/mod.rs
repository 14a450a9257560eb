pub mod department_handler;

pub use department_handler::{
    __path_create_department, __path_list_departments, create_department, list_departments,
};
