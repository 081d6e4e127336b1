//! Exercises the MAX_COMPONENTS=64 boundary in isolation: the component type
//! registry is a single process-wide static, so this lives in its own test
//! binary rather than alongside tests that register their own types.

use archetype_ecs::component::component_type_id;
use archetype_ecs::Component;

macro_rules! define_components {
    ($($name:ident),*) => {
        $(
            #[derive(Debug, Clone, Copy)]
            #[allow(dead_code)]
            struct $name(u8);
            impl Component for $name {}
        )*
    };
}

define_components!(
    C00, C01, C02, C03, C04, C05, C06, C07, C08, C09, C10, C11, C12, C13, C14, C15, C16, C17,
    C18, C19, C20, C21, C22, C23, C24, C25, C26, C27, C28, C29, C30, C31, C32, C33, C34, C35,
    C36, C37, C38, C39, C40, C41, C42, C43, C44, C45, C46, C47, C48, C49, C50, C51, C52, C53,
    C54, C55, C56, C57, C58, C59, C60, C61, C62, C63
);

#[derive(Debug, Clone, Copy)]
#[allow(dead_code)]
struct OneTooMany(u8);
impl Component for OneTooMany {}

#[test]
fn registering_sixty_four_types_succeeds_a_sixty_fifth_panics() {
    // Registering all 64 distinct types must succeed.
    component_type_id::<C00>();
    component_type_id::<C01>();
    component_type_id::<C02>();
    component_type_id::<C03>();
    component_type_id::<C04>();
    component_type_id::<C05>();
    component_type_id::<C06>();
    component_type_id::<C07>();
    component_type_id::<C08>();
    component_type_id::<C09>();
    component_type_id::<C10>();
    component_type_id::<C11>();
    component_type_id::<C12>();
    component_type_id::<C13>();
    component_type_id::<C14>();
    component_type_id::<C15>();
    component_type_id::<C16>();
    component_type_id::<C17>();
    component_type_id::<C18>();
    component_type_id::<C19>();
    component_type_id::<C20>();
    component_type_id::<C21>();
    component_type_id::<C22>();
    component_type_id::<C23>();
    component_type_id::<C24>();
    component_type_id::<C25>();
    component_type_id::<C26>();
    component_type_id::<C27>();
    component_type_id::<C28>();
    component_type_id::<C29>();
    component_type_id::<C30>();
    component_type_id::<C31>();
    component_type_id::<C32>();
    component_type_id::<C33>();
    component_type_id::<C34>();
    component_type_id::<C35>();
    component_type_id::<C36>();
    component_type_id::<C37>();
    component_type_id::<C38>();
    component_type_id::<C39>();
    component_type_id::<C40>();
    component_type_id::<C41>();
    component_type_id::<C42>();
    component_type_id::<C43>();
    component_type_id::<C44>();
    component_type_id::<C45>();
    component_type_id::<C46>();
    component_type_id::<C47>();
    component_type_id::<C48>();
    component_type_id::<C49>();
    component_type_id::<C50>();
    component_type_id::<C51>();
    component_type_id::<C52>();
    component_type_id::<C53>();
    component_type_id::<C54>();
    component_type_id::<C55>();
    component_type_id::<C56>();
    component_type_id::<C57>();
    component_type_id::<C58>();
    component_type_id::<C59>();
    component_type_id::<C60>();
    component_type_id::<C61>();
    component_type_id::<C62>();
    let last = component_type_id::<C63>();
    assert_eq!(last, 63);

    // The 65th distinct type ever seen by this process must panic.
    let result = std::panic::catch_unwind(|| component_type_id::<OneTooMany>());
    assert!(result.is_err());
}
