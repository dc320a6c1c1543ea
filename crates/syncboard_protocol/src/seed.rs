//! Deployment seed data.
//!
//! Used by the store the first time it runs against an empty or unreadable
//! snapshot location. The store takes the seed as a value, so tests and other
//! deployments can pass their own.

use crate::model::{ApplicationState, Item, Section};

/// The starter board shipped with the service: ten sections, no unassigned items.
#[rustfmt::skip]
pub fn default_board() -> ApplicationState {
    ApplicationState::new(
        vec![
            section(1, "김민경", &[
                (40, "임하은"), (9, "김선아"), (53, "최선미"), (57, "서민지"),
                (95, "박지은"), (73, "이새봄"), (50, "김재준"), (51, "진기성"),
                (59, "서희원"), (58, "최민서"), (77, "안희웅"), (200, "김현지"),
                (55, "김조경"),
            ]),
            section(2, "신현교", &[
                (82, "박상호"), (8, "신성민"), (13, "김준영"), (14, "채정훈"),
                (65, "조병학"), (84, "이혜지"), (47, "유진호"), (74, "유형철"),
            ]),
            section(3, "김정민", &[
                (39, "고예진"), (46, "김상민"), (19, "이예은"), (54, "서한나"),
                (87, "박상현"), (97, "전도훈"), (64, "장승호"), (90, "허예원"),
                (85, "유호준"), (78, "이창욱"), (207, "최현오"), (70, "오윤식"),
            ]),
            section(4, "강성전", &[
                (69, "박찬"), (72, "최우철"), (81, "윤효선"), (2, "정여진"),
                (91, "최현준"), (92, "서광은"), (93, "이희범"), (79, "김은희"),
                (41, "김혜원"), (4, "여민구"), (205, "이현호"), (206, "오주영"),
                (204, "최성민"),
            ]),
            section(5, "주효민", &[
                (43, "김온유"), (12, "최한길"), (42, "조성용"), (16, "윤병진"),
                (17, "이청관"),
            ]),
            section(7, "최우형", &[
                (38, "김예지"), (1, "이세화"), (10, "김혜린"), (60, "박지성"),
                (62, "이주찬"), (36, "최선호"), (96, "조효은"), (202, "김영광"),
                (203, "오창석"),
            ]),
            section(8, "염기현", &[
                (11, "김명진"), (27, "이민석"), (28, "황청환"), (33, "이찬호(혜선)"),
                (56, "김초롱"), (52, "이용환"),
            ]),
            section(9, "김윤주", &[
                (68, "박재형"), (75, "김환철"), (3, "김유태"), (63, "이하은"),
                (15, "김태진"), (26, "정의진"),
            ]),
            section(10, "고아라", &[
                (80, "양영후"), (44, "유재홍"), (45, "김지선"), (29, "장병찬"),
                (18, "김수아"), (21, "조효진"), (22, "원소연"), (23, "최아연"),
                (89, "이현중"), (30, "박미연"), (201, "신예은"),
            ]),
            section(11, "서한솔", &[
                (67, "김민은"), (5, "김영욱"), (6, "이경은"), (76, "김정빈"),
                (49, "권귀성"), (94, "김성호"), (66, "차지원"), (37, "김현진"),
                (86, "오에스더"),
            ]),
        ],
        Vec::new(),
    )
}

fn section(id: i64, title: &str, items: &[(i64, &str)]) -> Section {
    let items = items.iter().map(|&(id, name)| Item::new(id, name)).collect();
    Section::new(id, title, items)
}
